use serde::{Deserialize, Serialize};
use std::fmt;

/// KEGG Orthologous group 識別碼清單，保持檔案中的順序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KoList {
    pub ids: Vec<String>,
}

impl KoList {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }

    /// 每行一個識別碼；空行略過，前後空白（含 `\r`）去除
    pub fn from_text(text: &str) -> Self {
        let ids = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { ids }
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        Self::from_text(&String::from_utf8_lossy(data))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Pairs every identifier with `color`, one `"<id> <color>\n"` line each.
///
/// Neither side is validated; tokens are passed to the remote form verbatim.
pub fn build_color_block<S: AsRef<str>>(ids: &[S], color: &str) -> String {
    let mut block = String::new();
    for id in ids {
        block.push_str(id.as_ref());
        block.push(' ');
        block.push_str(color);
        block.push('\n');
    }
    block
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    Submitted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Initialized => "initialized",
            SessionState::Submitted => "submitted",
        };
        f.write_str(name)
    }
}

/// 瀏覽器取得的一個 HTML 頁面
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub url: String,
    pub body: String,
}

impl Page {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMethod {
    #[default]
    Get,
    Post,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormEnctype {
    #[default]
    UrlEncoded,
    Multipart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

/// A parsed `<form>` with the values a browser would submit by default.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HtmlForm {
    pub action: Option<String>,
    pub method: FormMethod,
    pub enctype: FormEnctype,
    pub fields: Vec<FormField>,
}

impl HtmlForm {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }

    /// Replaces the value of the first field named `name`.
    ///
    /// Returns `false` and leaves the form untouched when no such field exists.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.fields.iter_mut().find(|field| field.name == name) {
            Some(field) => {
                field.value = value.into();
                true
            }
            None => false,
        }
    }
}

/// 結果頁中的路徑圖連結
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathwayLink {
    pub href: String,
    pub pathway: String,
}

/// One full run: which KOs to colour and where the map goes.
#[derive(Debug, Clone)]
pub struct MapRequest {
    pub ko_file: String,
    pub output: String,
    pub color: String,
    pub pathway: String,
    pub organism: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalOutcome {
    Downloaded {
        pathway: String,
        path: String,
        bytes: usize,
    },
    /// 零個或多個連結符合，未下載任何檔案
    NotFound { pathway: String, matches: usize },
}

impl RetrievalOutcome {
    pub fn is_downloaded(&self) -> bool {
        matches!(self, RetrievalOutcome::Downloaded { .. })
    }

    pub fn not_found_message(program: &str, pathway: &str) -> String {
        format!(
            "{} (error): {} do not contain the given KO list.",
            program, pathway
        )
    }

    /// 輸出到 stdout 的結果訊息
    pub fn stdout_message(&self, program: &str) -> String {
        match self {
            RetrievalOutcome::Downloaded { path, .. } => {
                format!("✅ Pathway map saved to: {}", path)
            }
            RetrievalOutcome::NotFound { pathway, .. } => {
                Self::not_found_message(program, pathway)
            }
        }
    }
}
