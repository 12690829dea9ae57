use metrics::counter;

pub fn record_stream_opened(kind: &str) {
    counter!("courier_trace_streams_opened_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_trace_record() {
    counter!("courier_trace_records_total").increment(1);
}

pub fn record_heartbeat() {
    counter!("courier_trace_heartbeats_total").increment(1);
}

pub fn record_filtered() {
    counter!("courier_trace_records_filtered_total").increment(1);
}

pub fn record_stream_error(category: &str) {
    counter!("courier_trace_errors_total", "category" => category.to_string()).increment(1);
}
