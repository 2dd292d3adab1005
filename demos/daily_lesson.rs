//! Generate one lesson against a live endpoint and deliver it to an
//! in-memory mailbox.
//!
//! Set `OPENAI_API_KEY` first. Run with: `cargo run --example daily_lesson`

use std::sync::Arc;

use lessonmail::{
    render_text, send_lesson, ContentMode, Generator, LessonRequest, Mailer, MemoryMailer,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = std::env::var("OPENAI_API_KEY")?;

    let generator = Generator::builder("https://api.openai.com")
        .openai_with_key(api_key)
        .model_id("gpt-4o-mini")
        .build();

    let request = LessonRequest::new("Rust lifetimes")
        .with_mode(ContentMode::Overview)
        .with_audience("developers coming from garbage-collected languages");

    let lesson = generator.generate(&request).await?;
    if !lesson.usable() {
        println!("Model answered off-format; delivering the placeholder lesson anyway.");
    }
    println!("Extraction stage: {}", lesson.diagnostics.stage.as_str());

    // A real deployment would plug in an SMTP- or API-backed Mailer here.
    let mailbox = Arc::new(MemoryMailer::new());
    let mailer: Arc<dyn Mailer> = mailbox.clone();
    let email = send_lesson(&mailer, "learner@example.com", &lesson, render_text, &None).await?;

    println!(
        "\nDelivered to {} ({} message(s) in mailbox)",
        email.to,
        mailbox.sent().len()
    );
    println!("Subject: {}\n", email.subject);
    println!("{}", email.body);

    Ok(())
}
