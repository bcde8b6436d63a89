use super::Interceptor;
use crate::error::InterceptorError;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Writes one markdown transcript per exchange into a directory.
#[derive(Debug)]
pub struct FileInterceptor {
    base_path: PathBuf,
}

impl FileInterceptor {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[async_trait]
impl Interceptor for FileInterceptor {
    async fn save(&self, instruction: &str, reply: &str) -> Result<(), InterceptorError> {
        let timestamp = Utc::now();
        let filename = format!("exchange_{}.md", timestamp.format("%Y%m%d_%H%M%S_%6f"));
        let file_path = self.base_path.join(filename);

        let content = format!(
            "# Instruction\n\n{}\n\n# Reply\n\n{}\n",
            instruction,
            reply
        );

        write_transcript(&self.base_path, &file_path, &content)
            .await
            .map_err(|source| InterceptorError::Io {
                path: file_path.display().to_string(),
                source,
            })?;

        debug!(target: "guided_quiz::interceptor", path = %file_path.display(), "recorded exchange");
        Ok(())
    }
}

async fn write_transcript(dir: &Path, file_path: &Path, content: &str) -> std::io::Result<()> {
    fs::create_dir_all(dir).await?;
    let mut file = fs::File::create(file_path).await?;
    file.write_all(content.as_bytes()).await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_instruction_and_reply() {
        let dir = tempfile::tempdir().unwrap();
        let interceptor = FileInterceptor::new(dir.path().join("transcripts"));

        interceptor.save("Grade this answer", r#"{"isCorrect":true}"#).await.unwrap();

        let mut entries = std::fs::read_dir(interceptor.base_path()).unwrap();
        let entry = entries.next().unwrap().unwrap();
        let name = entry.file_name().into_string().unwrap();
        assert!(name.starts_with("exchange_") && name.ends_with(".md"));

        let content = std::fs::read_to_string(entry.path()).unwrap();
        assert!(content.contains("# Instruction\n\nGrade this answer"));
        assert!(content.contains(r#"# Reply

{"isCorrect":true}"#));
        assert!(entries.next().is_none());
    }

    #[tokio::test]
    async fn unwritable_directory_is_an_interceptor_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "occupied").unwrap();
        let interceptor = FileInterceptor::new(&blocker);

        let err = interceptor.save("instruction", "reply").await.unwrap_err();
        let InterceptorError::Io { path, .. } = err;
        assert!(path.contains("not-a-dir"));
    }
}
