use crate::domain::model::{HtmlForm, Page};
use crate::utils::error::Result;
use async_trait::async_trait;
use url::Url;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn form_path(&self) -> &str;
    fn link_prefix(&self) -> &str;
    fn identifiers_field(&self) -> &str;
    fn organism_field(&self) -> &str;

    /// 著色工具表單頁的完整 URL
    fn form_url(&self) -> Result<Url> {
        Ok(Url::parse(self.base_url())?.join(self.form_path())?)
    }
}

/// Stateful browsing session against a remote HTML site.
///
/// Implementations keep a page history: `open`, `submit_form` and
/// `follow_link` push the page they load, `back` pops one. `fetch_resource`
/// downloads raw bytes and leaves the history alone.
#[async_trait]
pub trait FormBrowser: Send {
    async fn open(&mut self, url: &str) -> Result<Page>;

    fn current(&self) -> Option<&Page>;

    /// 送出表單；action 以目前頁面的 URL 為基準解析
    async fn submit_form(&mut self, form: &HtmlForm) -> Result<Page>;

    async fn follow_link(&mut self, href: &str) -> Result<Page>;

    async fn fetch_resource(&self, url: &str) -> Result<Vec<u8>>;

    fn back(&mut self) -> Option<&Page>;
}
