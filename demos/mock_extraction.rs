//! Walk the extraction staircase without a live model.
//!
//! A [`MockModel`] cycles through a clean fenced reply, a reply cut off by
//! the token budget, and plain refusal prose; the diagnostics show which
//! stage rescued each. Run with: `cargo run --example mock_extraction`

use std::sync::Arc;

use lessonmail::{ContentMode, Generator, LessonRequest, MockModel};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let replies = vec![
        // Complete document, fenced the way chat models like to answer.
        concat!(
            "```json\n",
            "{\"concept\": {\"definition\": \"A lifetime names how long a reference lives.\"}, ",
            "\"key_points\": [\"the borrow checker enforces them\"], ",
            "\"summary\": \"Lifetimes bound references.\"}\n",
            "```"
        )
        .to_string(),
        // Cut off mid-array, as if max_tokens ran out.
        concat!(
            "{\"concept\": {\"definition\": \"A lifetime names how long a reference lives.\"}, ",
            "\"key_points\": [\"the borrow checker enforces them\", \"most are inferred"
        )
        .to_string(),
        // No document at all.
        "I'm sorry, I can't produce structured output for that.".to_string(),
    ];

    let generator = Generator::builder("http://unused")
        .model(Arc::new(MockModel::new(replies)))
        .build();

    let request = LessonRequest::new("Rust lifetimes").with_mode(ContentMode::Overview);
    for _ in 0..3 {
        let lesson = generator.generate(&request).await?;
        println!(
            "stage={:<11} usable={:<5} sections={}",
            lesson.diagnostics.stage.as_str(),
            lesson.usable(),
            lesson.sections.len()
        );
    }

    Ok(())
}
