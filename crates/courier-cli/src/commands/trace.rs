use anyhow::{Result, bail};
use courier_core::{ConsoleConfig, ErrorCategory, TraceKind, TraceRequest};
use courier_sdk::{
    CloseReason, CourierClient, RetryPolicy, SessionOutcome, StreamError, TokenStore,
    TraceObserver, TraceSession,
};
use tracing::{info, warn};

pub struct TraceArgs {
    pub kind: TraceKind,
    pub entity: String,
    pub filter: Option<String>,
    pub reconnect: bool,
    pub raw: bool,
}

struct ConsoleObserver<'a> {
    store: &'a TokenStore,
    label: String,
    raw: bool,
}

impl TraceObserver for ConsoleObserver<'_> {
    fn on_open(&mut self, _status: u16) {
        eprintln!("Tracing {} (Ctrl-C to stop)", self.label);
    }

    fn on_record(&mut self, record: &serde_json::Value) {
        if self.raw {
            println!("{record}");
            return;
        }
        let ts = chrono::Local::now().format("%H:%M:%S%.3f");
        let body = serde_json::to_string_pretty(record).unwrap_or_else(|_| record.to_string());
        println!("{ts} {body}");
    }

    fn on_unauthorized(&mut self) {
        eprintln!("{}", ErrorCategory::Unauthorized.notice());
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored token");
        }
        eprintln!("Run `courier login --token <token>` and try again");
    }

    fn on_forbidden(&mut self) {
        eprintln!("{}", ErrorCategory::Forbidden.notice());
    }

    fn on_error(&mut self, error: &StreamError) {
        eprintln!("{}: {error}", error.category().notice());
    }

    fn on_close(&mut self, reason: CloseReason) {
        match reason {
            CloseReason::ServerClosed => eprintln!("Stream closed by server"),
            CloseReason::Cancelled => eprintln!("Trace stopped"),
        }
    }
}

pub async fn run(config: &ConsoleConfig, store: &TokenStore, args: TraceArgs) -> Result<()> {
    let client = CourierClient::from_config(config, store.load()?);
    let mut session = TraceSession::new(client);
    let request = TraceRequest::new(args.kind, args.entity);
    let mut retry = RetryPolicy::new().with_max_attempts(config.trace.max_reconnect_attempts);
    let mut observer = ConsoleObserver {
        store,
        label: format!("{} {}", request.kind, request.entity),
        raw: args.raw,
    };

    loop {
        // Filter and request errors surface here, before anything is sent.
        let stop = session.start(request.clone(), args.filter.as_deref())?;
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stop.cancel();
            }
        });

        let outcome = session.run(&mut observer).await?;
        ctrl_c.abort();

        let stats = session.stats();
        info!(
            records = stats.records,
            filtered = stats.filtered,
            heartbeats = stats.heartbeats,
            "Trace stream finished"
        );

        match outcome {
            SessionOutcome::Cancelled => return Ok(()),
            SessionOutcome::Failed(category) => bail!("Trace failed ({category})"),
            SessionOutcome::ServerClosed if !args.reconnect => return Ok(()),
            SessionOutcome::ServerClosed => {}
        }

        if stats.records + stats.heartbeats > 0 {
            retry.reset();
        }
        let Some(delay) = retry.next_delay() else {
            warn!(attempts = retry.attempts(), "Giving up on reconnecting");
            return Ok(());
        };

        info!(
            delay_ms = delay.as_millis() as u64,
            attempt = retry.attempts(),
            "Reconnecting trace stream"
        );
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}
