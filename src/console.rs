//! Menu-driven text interface over [`UserService`].
//!
//! The controller is generic over its input and output so the binary can
//! drive it from stdin/stdout and tests from in-memory buffers.

use crate::error::{AppError, AppResult};
use crate::services::UserService;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

const MENU: &str = "\n--- Menu ---\n\
1. Create user\n\
2. Find user by ID\n\
3. Update user\n\
4. Delete user\n\
5. List all users\n\
0. Exit\n";

/// Result of reading one line of input
enum Line {
    Text(String),
    Eof,
}

pub struct ConsoleController<R, W> {
    service: UserService,
    input: R,
    output: W,
}

impl<R, W> ConsoleController<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(service: UserService, input: R, output: W) -> Self {
        Self {
            service,
            input,
            output,
        }
    }

    /// Give back the output sink, e.g. to inspect what was written
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run the menu loop until `0` or end of input.
    ///
    /// Only I/O failures end the loop with an error; every service error is
    /// reported and the menu is shown again.
    pub async fn run(&mut self) -> AppResult<()> {
        loop {
            self.write(MENU).await?;
            let choice = match self.prompt("Choice: ").await? {
                Line::Text(choice) => choice,
                Line::Eof => {
                    debug!("Input closed, leaving menu loop");
                    break;
                }
            };

            let outcome = match choice.as_str() {
                "1" => self.create_user().await,
                "2" => self.find_user().await,
                "3" => self.update_user().await,
                "4" => self.delete_user().await,
                "5" => self.list_users().await,
                "0" => break,
                _ => self.write_line("Invalid choice. Try again.").await,
            };

            if let Err(e) = outcome {
                self.report(e).await?;
            }
        }

        self.write_line("Exiting.").await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn create_user(&mut self) -> AppResult<()> {
        let name = self.prompt_text("Name: ").await?;
        let email = self.prompt_text("Email: ").await?;
        let age: i32 = self.prompt_number("Age: ").await?;

        let user = self.service.create_user(&name, &email, age).await?;
        self.write_line(&format!("User created: {}", user)).await
    }

    async fn find_user(&mut self) -> AppResult<()> {
        let id: i64 = self.prompt_number("ID: ").await?;

        let user = self.service.get_user_by_id(Some(id)).await?;
        self.write_line(&format!("Found: {}", user)).await
    }

    async fn update_user(&mut self) -> AppResult<()> {
        let id: i64 = self.prompt_number("ID of user to update: ").await?;

        // Resolve first so a bad id is reported before asking for new values
        self.service.get_user_by_id(Some(id)).await?;

        let name = self.prompt_text("New name: ").await?;
        let email = self.prompt_text("New email: ").await?;
        let age: i32 = self.prompt_number("New age: ").await?;

        let user = self.service.update_user(Some(id), &name, &email, age).await?;
        self.write_line(&format!("User updated: {}", user)).await
    }

    async fn delete_user(&mut self) -> AppResult<()> {
        let id: i64 = self.prompt_number("ID of user to delete: ").await?;

        let user = self.service.delete_user_by_id(Some(id)).await?;
        self.write_line(&format!("User deleted: {}", user)).await
    }

    async fn list_users(&mut self) -> AppResult<()> {
        let users = self.service.get_all_users().await?;
        if users.is_empty() {
            return self.write_line("No users.").await;
        }
        for user in users {
            self.write_line(&user.to_string()).await?;
        }
        Ok(())
    }

    async fn report(&mut self, err: AppError) -> AppResult<()> {
        match err {
            AppError::NotFound(_) => self.write_line("User not found.").await,
            AppError::Validation(msg) => self.write_line(&format!("Invalid input: {}", msg)).await,
            AppError::Persistence(e) => {
                warn!("Operation failed: {}", e);
                self.write_line(&format!("Operation failed: {}", e)).await
            }
            // I/O, config and init failures cannot be recovered from inside the loop
            other => Err(other),
        }
    }

    async fn prompt(&mut self, label: &str) -> AppResult<Line> {
        self.write(label).await?;
        self.output.flush().await?;

        // Undecodable bytes become U+FFFD so they fail validation instead of the loop
        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(Line::Eof);
        }
        Ok(Line::Text(String::from_utf8_lossy(&buf).trim().to_string()))
    }

    /// Prompt for a field; end of input reads as an empty value
    async fn prompt_text(&mut self, label: &str) -> AppResult<String> {
        match self.prompt(label).await? {
            Line::Text(text) => Ok(text),
            Line::Eof => Ok(String::new()),
        }
    }

    async fn prompt_number<T: FromStr>(&mut self, label: &str) -> AppResult<T> {
        let raw = self.prompt_text(label).await?;
        raw.parse::<T>()
            .map_err(|_| AppError::Validation(format!("Invalid number: {}", raw)))
    }

    async fn write(&mut self, text: &str) -> AppResult<()> {
        self.output.write_all(text.as_bytes()).await?;
        Ok(())
    }

    async fn write_line(&mut self, text: &str) -> AppResult<()> {
        self.write(text).await?;
        self.write("\n").await
    }
}
