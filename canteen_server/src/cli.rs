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
    // Only variables that are safe to print. Secrets stay out of this list.
    const DISPLAY_ENVS: [&str; 7] = [
        "RUST_LOG",
        "CANTEEN_HOST",
        "CANTEEN_PORT",
        "CANTEEN_DATABASE_URL",
        "CANTEEN_ALLOW_UNPAID_ORDERS",
        "CANTEEN_RAZORPAY_API_URL",
        "CANTEEN_CURRENCY",
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
