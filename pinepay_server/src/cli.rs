use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Only variables that never hold secrets. PPG_PINELABS_CLIENT_SECRET is left out.
    const DISPLAY_ENVS: [&str; 14] = [
        "RUST_LOG",
        "PPG_HOST",
        "PPG_PORT",
        "PPG_DATABASE_URL",
        "PPG_ORPHAN_SWEEP_INTERVAL",
        "PPG_RECONCILE_AFTER_REFUND",
        "PPG_PINELABS_TOKEN_URL",
        "PPG_PINELABS_ORDER_URL",
        "PPG_PINELABS_ORDER_DETAILS_URL",
        "PPG_PINELABS_REFUND_URL",
        "PPG_PINELABS_CLIENT_ID",
        "PPG_PINELABS_GRANT_TYPE",
        "PPG_PINELABS_TOKEN_LIFETIME",
        "PPG_PINELABS_REQUEST_TIMEOUT",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
