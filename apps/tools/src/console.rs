use async_trait::async_trait;
use client_core::{ConfirmPrompt, Confirmer, Notifier, Toast, ToastLevel};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

/// Toasts and alerts on the terminal.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn toast(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Success => println!("ok: {}", toast.message),
            ToastLevel::Info => println!("{}", toast.message),
            ToastLevel::Error => eprintln!("error: {}", toast.message),
        }
    }

    fn alert(&self, message: &str) {
        eprintln!("!! {message}");
    }
}

/// Asks on stdout and reads the answer from stdin. Anything but y/yes is a no.
pub struct StdinConfirmer;

#[async_trait]
impl Confirmer for StdinConfirmer {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        let mut stdout = tokio::io::stdout();
        let question = format!("{} [y/N] ", prompt.text());
        if stdout.write_all(question.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
            return false;
        }

        let mut answer = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        if let Err(err) = stdin.read_line(&mut answer).await {
            warn!(error = %err, "could not read confirmation");
            return false;
        }
        is_yes(&answer)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes" | "s" | "si" | "sí")
}
