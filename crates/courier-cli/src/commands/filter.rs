use anyhow::{Context, Result, bail};
use courier_core::Filter;

pub fn check(expr: &str, sample: Option<&str>) -> Result<()> {
    let filter = match Filter::compile(expr) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("  {expr}");
            if let Some(pos) = e.position() {
                let column = expr[..pos].chars().count();
                eprintln!("  {}^", " ".repeat(column));
            }
            bail!(e);
        }
    };

    println!("Filter OK: {}", filter.source());

    if let Some(sample) = sample {
        let record: serde_json::Value =
            serde_json::from_str(sample).context("Sample is not valid JSON")?;
        if filter.matches(&record) {
            println!("Sample matches");
        } else {
            println!("Sample does not match");
        }
    }

    Ok(())
}
