//! Page parsing for the KEGG mapper flow.
//!
//! Everything that depends on the remote site's markup lives here so it can be
//! tested without a network and replaced when the upstream HTML changes.

use crate::domain::model::{FormEnctype, FormField, FormMethod, HtmlForm, PathwayLink};
use crate::utils::error::{MapperError, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// 結果頁中嵌入路徑圖影像的樣式
pub const IMAGE_PATTERN: &str = r#"<img src="([0-9A-Za-z_/.]*?)""#;

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| MapperError::ConfigError {
        message: format!("Invalid selector '{}': {:?}", css, e),
    })
}

/// `/kegg-bin/show_pathway?x/map00010.args` -> `map00010`.
///
/// Takes the last `/` segment and keeps what precedes its first `.`.
pub fn pathway_id_from_url(url: &str) -> &str {
    let last = url.rsplit('/').next().unwrap_or(url);
    last.split('.').next().unwrap_or(last)
}

/// Every link target on the page in document order: `a`/`area` hrefs and
/// `frame`/`iframe` sources.
pub fn extract_links(body: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(body);
    let link_sel = selector("a[href], area[href], frame[src], iframe[src]")?;

    Ok(document
        .select(&link_sel)
        .filter_map(|el| match el.value().name() {
            "frame" | "iframe" => el.value().attr("src"),
            _ => el.value().attr("href"),
        })
        .map(str::to_string)
        .collect())
}

/// Links starting with `prefix` whose pathway id equals `pathway`.
pub fn matching_pathway_links(body: &str, prefix: &str, pathway: &str) -> Result<Vec<PathwayLink>> {
    let links = extract_links(body)?
        .into_iter()
        .filter(|href| href.starts_with(prefix))
        .filter(|href| pathway_id_from_url(href) == pathway)
        .map(|href| PathwayLink {
            pathway: pathway.to_string(),
            href,
        })
        .collect();
    Ok(links)
}

/// 解析頁面上的第一個表單，只保留瀏覽器預設會送出的欄位
pub fn first_form(body: &str) -> Result<Option<HtmlForm>> {
    let document = Html::parse_document(body);
    let form_sel = selector("form")?;
    let field_sel = selector("input, select, textarea")?;
    let option_sel = selector("option")?;

    let Some(form) = document.select(&form_sel).next() else {
        return Ok(None);
    };

    let attrs = form.value();
    let method = match attrs.attr("method") {
        Some(m) if m.eq_ignore_ascii_case("post") => FormMethod::Post,
        _ => FormMethod::Get,
    };
    let enctype = match attrs.attr("enctype") {
        Some(e) if e.eq_ignore_ascii_case("multipart/form-data") => FormEnctype::Multipart,
        _ => FormEnctype::UrlEncoded,
    };
    let action = attrs
        .attr("action")
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string);

    let mut fields = Vec::new();
    for field in form.select(&field_sel) {
        let el = field.value();
        let Some(name) = el.attr("name").filter(|n| !n.is_empty()) else {
            continue;
        };
        if el.attr("disabled").is_some() {
            continue;
        }

        let value = match el.name() {
            "textarea" => Some(field.text().collect::<String>()),
            "select" => select_value(&field, &option_sel),
            _ => input_value(&field),
        };

        if let Some(value) = value {
            fields.push(FormField {
                name: name.to_string(),
                value,
            });
        }
    }

    Ok(Some(HtmlForm {
        action,
        method,
        enctype,
        fields,
    }))
}

fn input_value(input: &ElementRef<'_>) -> Option<String> {
    let el = input.value();
    let kind = el.attr("type").unwrap_or("text").to_ascii_lowercase();
    match kind.as_str() {
        "submit" | "button" | "image" | "reset" | "file" => None,
        "checkbox" | "radio" => el
            .attr("checked")
            .map(|_| el.attr("value").unwrap_or("on").to_string()),
        _ => Some(el.attr("value").unwrap_or("").to_string()),
    }
}

fn select_value(select: &ElementRef<'_>, option_sel: &Selector) -> Option<String> {
    let options: Vec<ElementRef<'_>> = select.select(option_sel).collect();
    let chosen = options
        .iter()
        .find(|o| o.value().attr("selected").is_some())
        .or_else(|| options.first())?;

    Some(match chosen.value().attr("value") {
        Some(v) => v.to_string(),
        None => chosen.text().collect::<String>().trim().to_string(),
    })
}

/// 從連結頁面內容擷取路徑圖影像路徑
pub fn extract_image_reference(body: &str, page_url: &str) -> Result<String> {
    let re = Regex::new(IMAGE_PATTERN)?;
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| MapperError::ImageNotFound {
            url: page_url.to_string(),
        })
}
