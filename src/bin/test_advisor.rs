//! Ask the Groq advisor for a decision on a few indicator readings
//!
//! Checks that the API key works and shows the raw reply next to the
//! parsed decision, so prompt changes can be eyeballed before going live.
//!
//! Run with: GROQ_API_KEY=gsk-... cargo run --bin test_advisor -- 25 50 75

use anyhow::{Context, Result};
use rsibot::api::{http_client, GroqAdvisor};
use rsibot::config::{DEFAULT_GROQ_BASE_URL, DEFAULT_GROQ_MODEL};
use rsibot::Decision;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║              GROQ TRADE ADVISOR TEST                  ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");

    let api_key = std::env::var("GROQ_API_KEY").context("GROQ_API_KEY environment variable not set")?;
    println!("✅ Found GROQ_API_KEY");

    let model = std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_GROQ_MODEL.to_string());
    let base_url =
        std::env::var("GROQ_BASE_URL").unwrap_or_else(|_| DEFAULT_GROQ_BASE_URL.to_string());

    let mut readings = std::env::args()
        .skip(1)
        .map(|arg| {
            arg.parse::<f64>()
                .with_context(|| format!("Not an indicator value: {}", arg))
        })
        .collect::<Result<Vec<_>>>()?;
    if readings.is_empty() {
        readings = vec![25.0, 50.0, 75.0];
    }

    let advisor = GroqAdvisor::new(
        http_client(Duration::from_secs(30))?,
        base_url,
        api_key,
        model,
        "ETH",
    );

    println!("🤖 Model: {}\n", advisor.model());
    println!("═══════════════════════════════════════════════════════");

    let mut failures = 0;
    for value in &readings {
        println!("📍 RSI {}", value);

        let start = Instant::now();
        match advisor.reply(*value).await {
            Ok(reply) => {
                let decision = Decision::from_reply(&reply);
                println!("   Done in {:.1}s", start.elapsed().as_secs_f64());
                println!("   💬 Reply: {:?}", reply);
                println!("   ✅ Decision: {}", decision);

                if decision == Decision::Nothing && !reply.trim().eq_ignore_ascii_case("nothing") {
                    println!("   ⚠️  Reply was not a single keyword, treated as NOTHING");
                }
            }
            Err(e) => {
                failures += 1;
                println!("   ❌ Error: {}", e);
            }
        }
        println!();
    }

    println!("═══════════════════════════════════════════════════════");
    println!(
        "{} of {} calls succeeded",
        readings.len() - failures,
        readings.len()
    );

    if failures > 0 {
        anyhow::bail!("{} advisor calls failed", failures);
    }
    Ok(())
}
