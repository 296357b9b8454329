use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes a prepared request. Implementations may decorate the request
/// before sending it.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
