use crate::domain::model::{FormEnctype, FormMethod, HtmlForm, Page};
use crate::domain::ports::FormBrowser;
use crate::utils::error::{MapperError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

/// `FormBrowser` over a cookie-keeping `reqwest::Client` with a page history.
pub struct ReqwestBrowser {
    client: Client,
    timeout: Option<Duration>,
    history: Vec<Page>,
}

impl ReqwestBrowser {
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            timeout,
            history: Vec::new(),
        })
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// 以目前頁面為基準解析相對 URL
    fn resolve(&self, target: &str) -> Result<Url> {
        match self.history.last() {
            Some(page) => Ok(Url::parse(&page.url)?.join(target)?),
            None => Ok(Url::parse(target)?),
        }
    }

    async fn send(&self, mut request: reqwest::RequestBuilder) -> Result<Response> {
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("HTTP {} from {}", status, response.url());

        if !status.is_success() {
            return Err(MapperError::HttpStatus {
                url: response.url().to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn load(&mut self, request: reqwest::RequestBuilder) -> Result<Page> {
        let response = self.send(request).await?;
        // 重新導向後以最終 URL 作為頁面位置
        let url = response.url().to_string();
        let body = response.text().await?;

        let page = Page::new(url, body);
        self.history.push(page.clone());
        Ok(page)
    }
}

#[async_trait]
impl FormBrowser for ReqwestBrowser {
    async fn open(&mut self, url: &str) -> Result<Page> {
        let target = Url::parse(url)?;
        tracing::debug!("Opening {}", target);
        let request = self.client.get(target);
        self.load(request).await
    }

    fn current(&self) -> Option<&Page> {
        self.history.last()
    }

    async fn submit_form(&mut self, form: &HtmlForm) -> Result<Page> {
        let current = self.current().ok_or(MapperError::NoCurrentPage)?;
        let action = match &form.action {
            Some(action) => self.resolve(action)?,
            None => Url::parse(&current.url)?,
        };

        let pairs: Vec<(String, String)> = form
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect();

        tracing::debug!(
            "Submitting form to {} ({:?}, {:?}, {} fields)",
            action,
            form.method,
            form.enctype,
            pairs.len()
        );

        let request = match (form.method, form.enctype) {
            (FormMethod::Get, _) => self.client.get(action).query(&pairs),
            (FormMethod::Post, FormEnctype::UrlEncoded) => self.client.post(action).form(&pairs),
            (FormMethod::Post, FormEnctype::Multipart) => {
                let multipart = pairs
                    .into_iter()
                    .fold(reqwest::multipart::Form::new(), |acc, (name, value)| {
                        acc.text(name, value)
                    });
                self.client.post(action).multipart(multipart)
            }
        };

        self.load(request).await
    }

    async fn follow_link(&mut self, href: &str) -> Result<Page> {
        let target = self.resolve(href)?;
        tracing::debug!("Following link {}", target);
        let request = self.client.get(target);
        self.load(request).await
    }

    async fn fetch_resource(&self, url: &str) -> Result<Vec<u8>> {
        let target = self.resolve(url)?;
        tracing::debug!("Fetching resource {}", target);
        let response = self.send(self.client.get(target)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    fn back(&mut self) -> Option<&Page> {
        self.history.pop();
        self.history.last()
    }
}
