//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `crm_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use log::error;

fn main() {
    println!("crm_core ping={}", crm_core::ping());
    println!("crm_core version={}", crm_core::core_version());

    match crm_core::EnvironmentConfig::from_env() {
        Ok(config) => {
            println!("crm_core sign_up_disabled={}", config.is_sign_up_disabled);
            println!("crm_core log_level={}", config.effective_log_level());
        }
        Err(err) => {
            error!("event=cli_config module=cli status=error error={err}");
            eprintln!("crm_core config error: {err}");
            std::process::exit(2);
        }
    }

    match crm_core::open_db_in_memory().and_then(|conn| {
        crm_core::db::migrations::current_user_version(&conn)
    }) {
        Ok(version) => println!("crm_core schema_version={version}"),
        Err(err) => {
            eprintln!("crm_core db error: {err}");
            std::process::exit(1);
        }
    }
}
