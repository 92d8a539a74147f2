use crate::config::Environment;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directives used when `RUST_LOG` is not set
fn default_directives(env: &Environment) -> &'static str {
    match env {
        Environment::Dev => "tuneup_backend=debug,tower_http=debug,sqlx=warn,info",
        Environment::Staging => "tuneup_backend=debug,tower_http=info,sqlx=warn,info",
        Environment::Prod => "tuneup_backend=info,tower_http=info,sqlx=error,warn",
    }
}

pub fn init_logging(env: &Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(env)));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(env.is_dev())
        .with_line_number(env.is_dev());

    // JSON lines in production, human-readable elsewhere
    if matches!(env, Environment::Prod) {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.pretty())
            .init();
    }

    tracing::info!(env = ?env, "Logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_parse() {
        for env in [Environment::Dev, Environment::Staging, Environment::Prod] {
            let directives = default_directives(&env);
            assert!(directives.starts_with("tuneup_backend="));
            assert!(EnvFilter::try_new(directives).is_ok());
        }
    }
}
