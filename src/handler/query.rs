use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::embedding::zhipu::{EmbeddingClient, ZhipuOptions};
use crate::qa::RetrievalQa;
use crate::vector_store::chroma::ChromaStore;
use crate::Config;

async fn build_qa(config: &Config) -> anyhow::Result<RetrievalQa> {
    let store = ChromaStore::from_config(config).await?;
    let embedder = EmbeddingClient::new(ZhipuOptions::from_config(config))?;
    Ok(RetrievalQa::new(
        Arc::new(embedder),
        Arc::new(store),
        super::chat_client(config)?,
        config.system_prompt.clone(),
    ))
}

fn is_quit(input: &str) -> bool {
    input.eq_ignore_ascii_case("q")
}

pub async fn handle_query_session(config: &Config, top_k: usize) -> anyhow::Result<()> {
    let qa = build_qa(config).await?;
    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        print!("Enter a question (type q to quit): ");
        io::stdout().flush()?;
        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let question = input.trim();
        if is_quit(question) {
            break;
        }
        if question.is_empty() {
            continue;
        }

        let answer = qa.answer(question, top_k).await?;
        println!("\n{}\n", answer);
    }

    Ok(())
}

pub async fn answer_once(config: &Config, question: &str, top_k: usize) -> anyhow::Result<()> {
    let qa = build_qa(config).await?;
    println!("{}", qa.answer(question, top_k).await?);
    Ok(())
}
