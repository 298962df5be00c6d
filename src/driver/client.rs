use anyhow::Result;
use async_trait::async_trait;

/// Browser session seam: navigate somewhere, read back the rendered markup.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn goto(&self, url: &str) -> Result<()>;
    async fn page_source(&self) -> Result<String>;
}
