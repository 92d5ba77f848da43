use crate::core::html;
use crate::domain::model::{build_color_block, PathwayLink, RetrievalOutcome, SessionState};
use crate::domain::ports::{ConfigProvider, FormBrowser, Storage};
use crate::utils::error::{MapperError, Result};
use url::Url;

/// Session against the KEGG "Search & Color Pathway" tool.
///
/// Moves through `Uninitialized -> Initialized -> Submitted`. Image retrieval
/// is only allowed once a KO list has been submitted.
pub struct KeggSession<B: FormBrowser, S: Storage, C: ConfigProvider> {
    browser: B,
    storage: S,
    config: C,
    state: SessionState,
}

impl<B: FormBrowser, S: Storage, C: ConfigProvider> KeggSession<B, S, C> {
    pub fn new(browser: B, storage: S, config: C) -> Self {
        Self {
            browser,
            storage,
            config,
            state: SessionState::Uninitialized,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn base_url(&self) -> Result<Url> {
        Ok(Url::parse(self.config.base_url())?)
    }

    fn require_submitted(&self) -> Result<()> {
        if self.state != SessionState::Submitted {
            return Err(MapperError::invalid_state(SessionState::Submitted, self.state));
        }
        Ok(())
    }

    /// 開啟著色工具頁面
    pub async fn initialize(&mut self) -> Result<()> {
        let form_url = self.config.form_url()?;
        tracing::info!("🌐 Opening KEGG mapper page: {}", form_url);

        self.browser.open(form_url.as_str()).await?;
        self.state = SessionState::Initialized;
        Ok(())
    }

    /// Fills the first form on the page with the KO/colour block and submits it.
    ///
    /// Re-opens the tool page first unless the session is freshly initialized.
    pub async fn search_pathways<I: AsRef<str>>(
        &mut self,
        ids: &[I],
        color: &str,
        organism: Option<&str>,
    ) -> Result<()> {
        if self.state != SessionState::Initialized {
            self.initialize().await?;
        }

        let page = self.browser.current().ok_or(MapperError::NoCurrentPage)?;
        let mut form = html::first_form(&page.body)?.ok_or_else(|| MapperError::FormNotFound {
            url: page.url.clone(),
        })?;

        // 只填入表單原有的欄位
        let missing_field = |field: &str| MapperError::FieldNotFound {
            field: field.to_string(),
            url: page.url.clone(),
        };
        let identifiers_field = self.config.identifiers_field();
        if !form.set(identifiers_field, build_color_block(ids, color)) {
            return Err(missing_field(identifiers_field));
        }
        if let Some(org) = organism {
            let organism_field = self.config.organism_field();
            if !form.set(organism_field, org) {
                return Err(missing_field(organism_field));
            }
        }

        tracing::info!(
            "📤 Submitting {} KOs with color '{}' (organism: {})",
            ids.len(),
            color,
            organism.unwrap_or("default")
        );
        self.browser.submit_form(&form).await?;
        self.state = SessionState::Submitted;
        Ok(())
    }

    /// 在提交結果中尋找指定路徑圖，恰好一個連結時才下載
    pub async fn get_pathway_from_submission(
        &mut self,
        pathway: &str,
        destination: &str,
    ) -> Result<RetrievalOutcome> {
        self.require_submitted()?;

        let page = self.browser.current().ok_or(MapperError::NoCurrentPage)?;
        let links = html::matching_pathway_links(&page.body, self.config.link_prefix(), pathway)?;
        tracing::debug!("Found {} links for pathway {}", links.len(), pathway);

        match links.as_slice() {
            [link] => {
                let bytes = self.download_pathway_from_link(link, destination).await?;
                Ok(RetrievalOutcome::Downloaded {
                    pathway: pathway.to_string(),
                    path: destination.to_string(),
                    bytes,
                })
            }
            _ => {
                tracing::warn!(
                    "🔶 Pathway {} matched {} result links, nothing downloaded",
                    pathway,
                    links.len()
                );
                Ok(RetrievalOutcome::NotFound {
                    pathway: pathway.to_string(),
                    matches: links.len(),
                })
            }
        }
    }

    /// Follows `link`, downloads the map image to `destination` and returns its size.
    ///
    /// Always steps back to the result page once the link was followed, then
    /// reports the extraction or download error if there was one.
    pub async fn download_pathway_from_link(
        &mut self,
        link: &PathwayLink,
        destination: &str,
    ) -> Result<usize> {
        self.require_submitted()?;

        let page = self.browser.follow_link(&link.href).await?;
        let result = self.save_image(&page.body, &page.url, destination).await;

        if self.browser.back().is_none() {
            tracing::warn!("Browser history empty after visiting {}", page.url);
        }

        if let Err(e) = &result {
            tracing::error!("❌ Download of {} failed: {}", link.pathway, e);
        }
        result
    }

    async fn save_image(&self, body: &str, page_url: &str, destination: &str) -> Result<usize> {
        let image_ref = html::extract_image_reference(body, page_url)?;
        let image_url = self.base_url()?.join(&image_ref)?;
        tracing::info!("🖼️ Downloading pathway image: {}", image_url);

        let data = self.browser.fetch_resource(image_url.as_str()).await?;
        self.storage.write_file(destination, &data).await?;
        Ok(data.len())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::toml_config::ServiceConfig;
    use crate::domain::model::{HtmlForm, Page};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    pub(crate) const BASE: &str = "https://kegg.test";

    pub(crate) const FORM_PAGE: &str = r#"
<form action="/kegg-bin/color_pathway_object" method="post">
  <input type="hidden" name="map" value="map">
  <textarea name="unclassified"></textarea>
  <input type="text" name="org" value="ko">
  <input type="submit" value="Exec">
</form>"#;

    pub(crate) fn result_page(hrefs: &[&str]) -> String {
        let items: Vec<String> = hrefs
            .iter()
            .map(|h| format!(r#"<li><a href="{}">map</a></li>"#, h))
            .collect();
        format!("<html><ul>{}</ul></html>", items.join("\n"))
    }

    /// 以 URL/href 對應固定回應的記憶體瀏覽器
    #[derive(Default)]
    pub(crate) struct MockBrowser {
        pub pages: HashMap<String, String>,
        pub resources: HashMap<String, Vec<u8>>,
        pub submit_response: String,
        pub history: Vec<Page>,
        pub submitted: Vec<HtmlForm>,
        pub calls: Vec<String>,
    }

    impl MockBrowser {
        fn load(&mut self, key: &str) -> Result<Page> {
            let body = self.pages.get(key).cloned().ok_or_else(|| MapperError::HttpStatus {
                url: key.to_string(),
                status: 404,
            })?;
            let page = Page::new(key, body);
            self.history.push(page.clone());
            Ok(page)
        }
    }

    #[async_trait]
    impl FormBrowser for MockBrowser {
        async fn open(&mut self, url: &str) -> Result<Page> {
            self.calls.push(format!("open {}", url));
            self.load(url)
        }

        fn current(&self) -> Option<&Page> {
            self.history.last()
        }

        async fn submit_form(&mut self, form: &HtmlForm) -> Result<Page> {
            self.calls.push("submit".to_string());
            self.submitted.push(form.clone());
            let page = Page::new(format!("{}/kegg-bin/color_pathway_object", BASE), self.submit_response.clone());
            self.history.push(page.clone());
            Ok(page)
        }

        async fn follow_link(&mut self, href: &str) -> Result<Page> {
            self.calls.push(format!("follow {}", href));
            self.load(href)
        }

        async fn fetch_resource(&self, url: &str) -> Result<Vec<u8>> {
            self.resources.get(url).cloned().ok_or_else(|| MapperError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
        }

        fn back(&mut self) -> Option<&Page> {
            self.history.pop();
            self.history.last()
        }
    }

    #[derive(Clone, Default)]
    pub(crate) struct MockStorage {
        pub files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        pub(crate) async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                MapperError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    pub(crate) fn test_config() -> ServiceConfig {
        ServiceConfig::default().with_base_url(Some(BASE.to_string()))
    }

    pub(crate) fn mock_browser(result_hrefs: &[&str]) -> MockBrowser {
        let mut browser = MockBrowser::default();
        browser
            .pages
            .insert(format!("{}/kegg/mapper/color.html", BASE), FORM_PAGE.to_string());
        browser.submit_response = result_page(result_hrefs);
        browser
    }

    fn session(browser: MockBrowser) -> KeggSession<MockBrowser, MockStorage, ServiceConfig> {
        KeggSession::new(browser, MockStorage::default(), test_config())
    }

    #[tokio::test]
    async fn test_initialize_opens_form_page() {
        let mut session = session(mock_browser(&[]));
        assert_eq!(session.state(), SessionState::Uninitialized);

        session.initialize().await.unwrap();

        assert_eq!(session.state(), SessionState::Initialized);
        assert_eq!(
            session.browser().calls,
            vec![format!("open {}/kegg/mapper/color.html", BASE)]
        );
    }

    #[tokio::test]
    async fn test_initialize_failure_keeps_state() {
        let mut session = session(MockBrowser::default());
        let err = session.initialize().await.unwrap_err();
        assert!(matches!(err, MapperError::HttpStatus { status: 404, .. }));
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn test_search_fills_form_fields() {
        let mut session = session(mock_browser(&[]));
        session.initialize().await.unwrap();

        session
            .search_pathways(&["K00001", "K00002"], "red", Some("hsa"))
            .await
            .unwrap();

        assert_eq!(session.state(), SessionState::Submitted);
        let form = &session.browser().submitted[0];
        assert_eq!(form.get("unclassified"), Some("K00001 red\nK00002 red\n"));
        assert_eq!(form.get("org"), Some("hsa"));
        assert_eq!(form.get("map"), Some("map"));
    }

    #[tokio::test]
    async fn test_search_without_organism_keeps_form_default() {
        let mut session = session(mock_browser(&[]));

        // 未初始化時自動開啟頁面
        session.search_pathways(&["K00001"], "blue", None).await.unwrap();

        let browser = session.browser();
        assert_eq!(browser.calls.len(), 2);
        assert!(browser.calls[0].starts_with("open "));
        assert_eq!(browser.submitted[0].get("org"), Some("ko"));
    }

    #[tokio::test]
    async fn test_search_twice_reinitializes() {
        let mut session = session(mock_browser(&[]));
        session.search_pathways(&["K00001"], "red", None).await.unwrap();
        session.search_pathways(&["K00002"], "red", None).await.unwrap();

        let opens = session
            .browser()
            .calls
            .iter()
            .filter(|c| c.starts_with("open "))
            .count();
        assert_eq!(opens, 2);
        assert_eq!(session.state(), SessionState::Submitted);
    }

    #[tokio::test]
    async fn test_search_without_form_fails() {
        let mut browser = MockBrowser::default();
        browser.pages.insert(
            format!("{}/kegg/mapper/color.html", BASE),
            "<html>maintenance</html>".to_string(),
        );
        let mut session = session(browser);

        let err = session.search_pathways(&["K00001"], "red", None).await.unwrap_err();
        assert!(matches!(err, MapperError::FormNotFound { .. }));
        assert_eq!(session.state(), SessionState::Initialized);
    }

    #[tokio::test]
    async fn test_search_rejects_form_without_identifiers_field() {
        let mut browser = MockBrowser::default();
        browser.pages.insert(
            format!("{}/kegg/mapper/color.html", BASE),
            r#"<form action="/search"><input name="org" value="ko"></form>"#.to_string(),
        );
        let mut session = session(browser);

        let err = session.search_pathways(&["K00001"], "red", None).await.unwrap_err();

        assert!(matches!(err, MapperError::FieldNotFound { ref field, .. } if field == "unclassified"));
        assert_eq!(session.state(), SessionState::Initialized);
        assert!(session.browser().submitted.is_empty());
    }

    #[tokio::test]
    async fn test_search_rejects_form_without_organism_field() {
        let mut browser = MockBrowser::default();
        browser.pages.insert(
            format!("{}/kegg/mapper/color.html", BASE),
            r#"<form action="/search"><textarea name="unclassified"></textarea></form>"#.to_string(),
        );
        let mut session = session(browser);

        let err = session
            .search_pathways(&["K00001"], "red", Some("hsa"))
            .await
            .unwrap_err();
        assert!(matches!(err, MapperError::FieldNotFound { ref field, .. } if field == "org"));
        assert!(session.browser().submitted.is_empty());

        // 未指定物種時不需要該欄位
        session.search_pathways(&["K00001"], "red", None).await.unwrap();
        assert_eq!(session.state(), SessionState::Submitted);
    }

    #[tokio::test]
    async fn test_retrieval_requires_submission() {
        let mut session = session(mock_browser(&[]));

        let err = session
            .get_pathway_from_submission("map00010", "out.png")
            .await
            .unwrap_err();
        assert!(matches!(err, MapperError::InvalidState { .. }));

        session.initialize().await.unwrap();
        let link = PathwayLink {
            href: "/kegg-bin/show_pathway?1/map00010.args".to_string(),
            pathway: "map00010".to_string(),
        };
        let err = session
            .download_pathway_from_link(&link, "out.png")
            .await
            .unwrap_err();
        assert!(matches!(err, MapperError::InvalidState { .. }));

        // 只有初始化時的一次 open，沒有其他網路呼叫
        assert_eq!(session.browser().calls.len(), 1);
        assert!(session.storage().get_file("out.png").await.is_none());
    }

    #[tokio::test]
    async fn test_single_match_downloads_image() {
        let href = "/kegg-bin/show_pathway?1234/map00010.args";
        let mut browser = mock_browser(&[href, "/kegg-bin/show_pathway?1234/map00020.args"]);
        browser.pages.insert(
            href.to_string(),
            r#"<html><img src="/tmp/mark_pathway1234/map00010.png" name="pathwayimage"></html>"#
                .to_string(),
        );
        browser.resources.insert(
            format!("{}/tmp/mark_pathway1234/map00010.png", BASE),
            b"PNGDATA".to_vec(),
        );
        let mut session = session(browser);
        session.search_pathways(&["K00001"], "red", None).await.unwrap();

        let outcome = session
            .get_pathway_from_submission("map00010", "maps/map00010.png")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RetrievalOutcome::Downloaded {
                pathway: "map00010".to_string(),
                path: "maps/map00010.png".to_string(),
                bytes: 7,
            }
        );
        assert_eq!(
            session.storage().get_file("maps/map00010.png").await.unwrap(),
            b"PNGDATA"
        );
        // 下載後回到結果頁
        let current = session.browser().current().unwrap();
        assert!(current.body.contains("map00020.args"));
        assert_eq!(session.state(), SessionState::Submitted);
    }

    #[tokio::test]
    async fn test_no_match_or_duplicates_skip_download() {
        for hrefs in [
            vec!["/kegg-bin/show_pathway?1/map00020.args"],
            vec![
                "/kegg-bin/show_pathway?1/map00010.args",
                "/kegg-bin/show_pathway?2/map00010.args",
            ],
            vec!["/other/map00010.args"],
        ] {
            let mut session = session(mock_browser(&hrefs));
            session.search_pathways(&["K00001"], "red", None).await.unwrap();

            let outcome = session
                .get_pathway_from_submission("map00010", "out.png")
                .await
                .unwrap();

            assert!(!outcome.is_downloaded());
            assert!(matches!(outcome, RetrievalOutcome::NotFound { ref pathway, .. } if pathway == "map00010"));
            assert!(session.storage().get_file("out.png").await.is_none());
            assert!(!session.browser().calls.iter().any(|c| c.starts_with("follow")));
        }
    }

    #[tokio::test]
    async fn test_failed_download_still_navigates_back() {
        let href = "/kegg-bin/show_pathway?1/map00010.args";
        let mut browser = mock_browser(&[href]);
        // 影像存在於頁面，但資源下載失敗
        browser.pages.insert(
            href.to_string(),
            r#"<img src="/tmp/missing.png">"#.to_string(),
        );
        let mut session = session(browser);
        session.search_pathways(&["K00001"], "red", None).await.unwrap();

        let err = session
            .get_pathway_from_submission("map00010", "out.png")
            .await
            .unwrap_err();

        assert!(matches!(err, MapperError::HttpStatus { status: 404, .. }));
        assert_eq!(
            session.browser().current().unwrap().url,
            format!("{}/kegg-bin/color_pathway_object", BASE)
        );
        assert!(session.storage().get_file("out.png").await.is_none());
    }

    #[tokio::test]
    async fn test_missing_image_reference_navigates_back() {
        let href = "/kegg-bin/show_pathway?1/map00010.args";
        let mut browser = mock_browser(&[href]);
        browser
            .pages
            .insert(href.to_string(), "<html>no image</html>".to_string());
        let mut session = session(browser);
        session.search_pathways(&["K00001"], "red", None).await.unwrap();

        let err = session
            .get_pathway_from_submission("map00010", "out.png")
            .await
            .unwrap_err();

        assert!(matches!(err, MapperError::ImageNotFound { .. }));
        assert_eq!(session.browser().history.len(), 2);
    }
}
