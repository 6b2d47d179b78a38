use dotenv::dotenv;
use statement_ratio_analyzer::llm::GeminiClient;
use statement_ratio_analyzer::{
    display_outcome, exchange, request_assessment, AnchorLabels, ChatMessage,
    ContainsLabelMatcher, RatioEngine,
};
use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let client = match GeminiClient::from_env() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ {}", display_outcome(Err(e)));
            return Ok(());
        }
    };

    if let Some(path) = std::env::args().nth(1).map(PathBuf::from) {
        let table = statement_ratio_analyzer::load_statement(&path)?;
        let engine =
            RatioEngine::with_matcher(ContainsLabelMatcher::new(AnchorLabels::bilingual()));
        let analysis = engine.analyze(&table);

        for warning in &analysis.warnings {
            println!("⚠️  {}", warning);
        }

        println!("Requesting assessment...\n");
        println!("{}\n", request_assessment(&client, &analysis).await);
    }

    let mut transcript = vec![ChatMessage::greeting()];
    println!("🤖 {}", transcript[0].content);
    println!("(type 'quit' to exit)");
    println!("------------------------------------------------------------------");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let prompt = input.trim();

        if prompt.eq_ignore_ascii_case("quit") || prompt.eq_ignore_ascii_case("exit") {
            break;
        }

        if prompt.is_empty() {
            continue;
        }

        println!("\nThinking...");
        let reply = exchange(&client, &mut transcript, prompt).await;
        println!("\n{}\n", reply);
        println!("------------------------------------------------------------------");
    }

    Ok(())
}
