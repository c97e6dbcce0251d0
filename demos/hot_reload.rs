use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use urlrewrite::RewriteEngine;

const V1: &str = r#"<rewrite><rules>
  <rule name="home"><match url="^/$" /><action type="Rewrite" url="/index.html" /></rule>
</rules></rewrite>"#;

const V2: &str = r#"<rewrite><rules>
  <rule name="maintenance"><match url=".*" /><action type="Rewrite" url="/maintenance.html" /></rule>
</rules></rewrite>"#;

const BROKEN: &str = r#"<rewrite><rules>
  <rule name="half done"><match url="^/x$" /></rule>
</rules></rewrite>"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let engine = Arc::new(RewriteEngine::from_xml(V1).expect("failed to load rules"));

    let reader = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for i in 0..6 {
                println!("request {i}: / -> {}", engine.evaluate("/", ""));
                thread::sleep(Duration::from_millis(50));
            }
        })
    };

    thread::sleep(Duration::from_millis(100));
    engine.reload_xml(V2).expect("failed to reload rules");

    // Rejected; the maintenance rules keep serving.
    if let Err(err) = engine.reload_xml(BROKEN) {
        println!("reload rejected: {err}");
    }

    reader.join().expect("reader thread panicked");
}
