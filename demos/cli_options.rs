//! Flattening grouped CLI options.
//!
//! This example shows the decoration/call cycle of record-flatten:
//! 1. Declare reusable option records with `Record`
//! 2. Flatten a command that takes them as parameters
//! 3. Hand the flat signature to a frontend (printed here as JSON)
//! 4. Call the command with flat keyword arguments
//!
//! Run with: `cargo run --example cli_options`

use record_flatten::{
    deserialize_record, ArgumentError, Arguments, Callable, DeclaredType, FieldSpec,
    FlattenOptions, Flattener, Kwargs, Marker, Record, RecordError,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct ConnectionOptions {
    host: String,
    port: u16,
}

impl Record for ConnectionOptions {
    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("host", DeclaredType::Str)
                .with_marker(Marker::option(["-H", "--host"]))
                .with_marker(Marker::Envvar("APP_HOST".to_string())),
            FieldSpec::new("port", DeclaredType::Int)
                .with_default(5432)
                .with_description("Port of the database server"),
        ]
    }

    fn construct(values: Kwargs) -> Result<Self, RecordError> {
        deserialize_record(values)
    }
}

#[derive(Debug, Deserialize)]
struct RetryOptions {
    attempts: u32,
    strategy: String,
}

impl Record for RetryOptions {
    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("attempts", DeclaredType::Int).with_default(3),
            FieldSpec::new("strategy", DeclaredType::choice(["fixed", "exponential"]))
                .with_default("exponential")
                .with_marker(Marker::help("Backoff between attempts")),
        ]
    }

    fn construct(values: Kwargs) -> Result<Self, RecordError> {
        let retry: RetryOptions = deserialize_record(values)?;
        if retry.attempts == 0 {
            return Err("attempts must be at least 1".into());
        }
        Ok(retry)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Flattening CLI Options Example ===\n");

    let migrate = Callable::new(
        "migrate",
        vec![
            FieldSpec::new("dry_run", DeclaredType::Bool)
                .with_default(false)
                .with_marker(Marker::option(["--dry-run"])),
            FieldSpec::record::<ConnectionOptions>("connection"),
            FieldSpec::record::<RetryOptions>("retry"),
        ],
        |mut args: Arguments| {
            let dry_run: bool = args.get("dry_run")?;
            let connection = args.take_record::<ConnectionOptions>("connection")?;
            let retry = args.take_record::<RetryOptions>("retry")?;
            Ok::<_, ArgumentError>(format!(
                "migrate {}:{} (dry_run={dry_run}, {} attempts, {} backoff)",
                connection.host, connection.port, retry.attempts, retry.strategy
            ))
        },
    );

    let flattener = Flattener::new(FlattenOptions::default().with_literals_to_enums(true));
    let flat = match flattener.flatten(&migrate) {
        Ok(flat) => flat,
        Err(e) => {
            eprintln!("Decoration failed: {}", e);
            return;
        }
    };

    println!("--- Flat signature ---");
    match serde_json::to_string_pretty(flat.signature()) {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => eprintln!("Could not render signature: {}", e),
    }

    println!("\n--- Scenario 1: Valid call ---");
    let kwargs = json!({"host": "db.internal", "attempts": 5, "strategy": "fixed"});
    match flat.call(kwargs.as_object().cloned().unwrap_or_default()) {
        Ok(out) => println!("{}", out),
        Err(e) => eprintln!("Call failed: {}", e),
    }

    println!("\n--- Scenario 2: Record rejects its values ---");
    let kwargs = json!({"host": "db.internal", "attempts": 0});
    match flat.call(kwargs.as_object().cloned().unwrap_or_default()) {
        Ok(out) => println!("Unexpected success: {}", out),
        Err(e) => println!("Call failed (expected): {}", e),
    }

    println!("\n--- Scenario 3: Colliding names are caught at decoration ---");
    let clash: Callable<(), ArgumentError> = Callable::new(
        "clash",
        vec![
            FieldSpec::new("host", DeclaredType::Str),
            FieldSpec::record::<ConnectionOptions>("connection"),
        ],
        |_args: Arguments| Ok(()),
    );
    match flattener.flatten(&clash) {
        Ok(_) => println!("Unexpected success"),
        Err(e) => println!("Decoration failed (expected): {}", e),
    }
}
