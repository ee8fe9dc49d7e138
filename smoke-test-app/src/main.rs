use std::cell::RefCell;
use std::sync::Arc;

use chrono::Utc;
use swap_quote::convert::{Field, FieldView};
use swap_quote::pricing::LogStatusSink;
use swap_quote::wallet::MissingWallet;
use swap_quote::{
    Converter, LogTradeStatusSink, QuoteCache, Result, SwapConfig, SwapDesk, SwapError, SwapSide,
    TradeStatus,
};

fn ensure(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(SwapError::Other(message.to_string()))
    }
}

fn with_step(step: &str, err: SwapError) -> SwapError {
    SwapError::Other(format!("{step}: {err}"))
}

#[derive(Default)]
struct Fields {
    base: RefCell<String>,
    quote: RefCell<String>,
}

impl FieldView for Fields {
    fn set_text(&self, field: Field, text: &str) {
        match field {
            Field::Base => *self.base.borrow_mut() = text.to_string(),
            Field::Quote => *self.quote.borrow_mut() = text.to_string(),
        }
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .init();

    let mut config = SwapConfig::from_env();
    if let Some(rpc_url) = std::env::args().nth(1).filter(|arg| !arg.trim().is_empty()) {
        config.rpc_url = rpc_url;
    }
    let require_live_prices = env_flag("SWAP_REQUIRE_LIVE_PRICES");

    println!("Running swap-quote smoke test against {}", config.rpc_url);
    match run(&config, require_live_prices).await {
        Ok(()) => {
            println!("Smoke test passed");
            std::process::ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Smoke test failed: {err}");
            std::process::ExitCode::FAILURE
        }
    }
}

fn load_dotenv() {
    let _ = dotenvy::from_filename_override("smoke-test-app/.env");
    let _ = dotenvy::dotenv_override();
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

async fn run(config: &SwapConfig, require_live_prices: bool) -> Result<()> {
    config.validate()?;
    let quotes = Arc::new(QuoteCache::from_config(config, Arc::new(LogStatusSink))?);

    // Offline conversion against the built-in prices first.
    let fields = Fields::default();
    let converter = Converter::from_config(quotes.clone(), config);
    converter.on_base_amount_typed("1", &fields).await;
    let fallback_nova = fields.quote.borrow().clone();
    converter.on_quote_amount_changed(&fallback_nova, &fields);
    ensure(
        fields.base.borrow().as_str() == "1.000000",
        "fallback conversion did not round-trip",
    )?;
    println!("fallback: 1 SOL = {fallback_nova} NOVA");

    let refresh = quotes.refresh_if_stale(Utc::now()).await;
    let failures = refresh.failures();
    if failures.is_empty() {
        ensure(
            quotes.is_fresh(Utc::now()),
            "quote should be fresh right after a successful refresh",
        )?;
        println!("live prices: {}", quotes.status_line());
    } else if require_live_prices {
        return Err(SwapError::Other(failures.join("; ")));
    } else {
        println!("live prices unavailable, kept fallback: {}", failures.join("; "));
    }

    converter.recompute(&fields);
    println!("current: 1 SOL = {} NOVA", fields.quote.borrow());

    let desk = SwapDesk::from_config(
        config,
        Arc::new(MissingWallet),
        quotes.clone(),
        Arc::new(LogTradeStatusSink),
    )?;
    let blockhash = desk
        .latest_blockhash()
        .await
        .map_err(|err| with_step("getLatestBlockhash", err))?;
    ensure(
        !blockhash.blockhash.is_empty(),
        "node returned an empty blockhash",
    )?;
    println!(
        "blockhash={}, last_valid_block_height={}",
        blockhash.blockhash, blockhash.last_valid_block_height
    );

    let status = desk.submit_swap(SwapSide::Buy, "0.01").await;
    ensure(
        status == TradeStatus::WalletMissing,
        "swap without a wallet should be refused",
    )?;
    let status = desk.connect_wallet().await;
    println!("wallet: {status}");

    Ok(())
}
