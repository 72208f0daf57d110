//! HTML 片段扫描工具
//!
//! 门户页面是老式 PL/SQL 生成的标记，只需要按文档顺序定位
//! `form` / `table` / `tr` / `td` / `input` 等元素，因此这里用
//! 大小写不敏感的标签扫描，而不是完整的 DOM 解析。
//! 嵌套同名元素按深度匹配闭合标签。`td` / `th` / `tr` 可省略闭合标签，
//! 在同一层的下一个单元格、行或表格结束处隐式结束；
//! 其他元素缺失闭合标签时延伸到父元素末尾。

use crate::error::Result;
use crate::models::FormData;
use regex::Regex;

/// 没有闭合标签的元素
const VOID_TAGS: &[&str] = &["input", "img", "br", "hr", "meta", "link"];

/// 单元格在这些标签处隐式结束
const CELL_STOPS: &[&str] = &[
    "<td", "<th", "<tr", "</tr", "</tbody", "</thead", "</tfoot", "</table",
];
/// 行在这些标签处隐式结束
const ROW_STOPS: &[&str] = &["<tr", "<tbody", "<tfoot", "</tbody", "</thead", "</tfoot", "</table"];

fn implied_stops(tag: &str) -> Option<&'static [&'static str]> {
    match tag {
        "td" | "th" => Some(CELL_STOPS),
        "tr" => Some(ROW_STOPS),
        _ => None,
    }
}

/// 已加载的页面
#[derive(Debug, Clone)]
pub struct Document {
    html: String,
    /// ASCII 小写副本，与原文字节位置一一对应
    lower: String,
}

impl Document {
    pub fn parse(html: impl Into<String>) -> Self {
        let html = html.into();
        let lower = html.to_ascii_lowercase();
        Self { html, lower }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// 整个页面作为根元素
    pub fn root(&self) -> Element<'_> {
        let len = self.html.len();
        Element {
            doc: self,
            start: 0,
            open_end: 0,
            close_start: len,
            end: len,
        }
    }

    pub fn find_all(&self, tag: &str) -> Vec<Element<'_>> {
        self.root().find_all(tag)
    }

    pub fn find(&self, tag: &str) -> Option<Element<'_>> {
        self.root().find(tag)
    }

    /// 文档顺序中第 `index` 个 `tag` 元素（含嵌套元素）
    pub fn nth(&self, tag: &str, index: usize) -> Option<Element<'_>> {
        self.root().nth(tag, index)
    }
}

/// 页面中的一个元素
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    doc: &'a Document,
    start: usize,
    open_end: usize,
    close_start: usize,
    end: usize,
}

impl<'a> Element<'a> {
    /// 所有后代 `tag` 元素，按文档顺序（与 BeautifulSoup 的 find_all 一致）
    pub fn find_all(&self, tag: &str) -> Vec<Element<'a>> {
        let tag = tag.to_ascii_lowercase();
        let lower = self.doc.lower.as_str();
        let open_pat = format!("<{}", tag);
        let limit = self.close_start;
        let is_void = VOID_TAGS.contains(&tag.as_str());
        let stops = implied_stops(&tag);

        let mut found = Vec::new();
        let mut pos = self.open_end;
        while let Some(start) = find_tag(lower, &open_pat, pos, limit) {
            let after = start + open_pat.len();
            let open_end = match lower[after..limit].find('>') {
                Some(i) => after + i + 1,
                None => break,
            };
            let (close_start, end) = if is_void || lower[..open_end].ends_with("/>") {
                (open_end, open_end)
            } else if let Some(stops) = stops {
                implied_close(lower, &tag, stops, open_end, limit)
            } else {
                matching_close(lower, &tag, open_end, limit)
            };
            found.push(Element {
                doc: self.doc,
                start,
                open_end,
                close_start,
                end,
            });
            pos = open_end;
        }
        found
    }

    pub fn find(&self, tag: &str) -> Option<Element<'a>> {
        self.find_all(tag).into_iter().next()
    }

    pub fn nth(&self, tag: &str, index: usize) -> Option<Element<'a>> {
        self.find_all(tag).into_iter().nth(index)
    }

    /// 是否包含某个后代元素
    pub fn contains_tag(&self, tag: &str) -> bool {
        self.find(tag).is_some()
    }

    pub fn outer_html(&self) -> &'a str {
        &self.doc.html[self.start..self.end]
    }

    pub fn inner_html(&self) -> &'a str {
        &self.doc.html[self.open_end..self.close_start]
    }

    /// 去除标签后的文字，实体已解码、空白已折叠
    pub fn text(&self) -> String {
        let stripped = strip_tags(self.inner_html());
        decode_entities(&stripped)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// 开始标签上的全部属性（名称小写，值已解码）
    pub fn attrs(&self) -> Result<Vec<(String, String)>> {
        let open = &self.doc.html[self.start..self.open_end];
        let body = open
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim_end_matches('/');
        let rest = match body.find(char::is_whitespace) {
            Some(i) => &body[i..],
            None => return Ok(Vec::new()),
        };

        let re = Regex::new(
            r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#,
        )?;
        let attrs = re
            .captures_iter(rest)
            .filter_map(|cap| {
                let name = cap.get(1)?.as_str().to_ascii_lowercase();
                let value = cap
                    .get(2)
                    .or_else(|| cap.get(3))
                    .or_else(|| cap.get(4))
                    .map(|m| decode_entities(m.as_str()))
                    .unwrap_or_default();
                Some((name, value))
            })
            .collect();
        Ok(attrs)
    }

    /// 读取单个属性（名称大小写不敏感）
    pub fn attr(&self, name: &str) -> Result<Option<String>> {
        let name = name.to_ascii_lowercase();
        Ok(self
            .attrs()?
            .into_iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v))
    }

    /// 指定 type 的 input 元素
    pub fn inputs_of_type(&self, kind: &str) -> Result<Vec<Element<'a>>> {
        let mut inputs = Vec::new();
        for input in self.find_all("input") {
            let matches = input
                .attr("type")?
                .map(|t| t.eq_ignore_ascii_case(kind))
                .unwrap_or(false);
            if matches {
                inputs.push(input);
            }
        }
        Ok(inputs)
    }

    /// 指定 type 的 input 名称，去重并保持顺序
    pub fn input_names_of_type(&self, kind: &str) -> Result<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        for input in self.inputs_of_type(kind)? {
            if let Some(name) = input.attr("name")? {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }

    /// 所有隐藏字段，按出现顺序
    pub fn hidden_fields(&self) -> Result<FormData> {
        let mut form = FormData::new();
        for input in self.inputs_of_type("hidden")? {
            if let Some(name) = input.attr("name")? {
                let value = input.attr("value")?.unwrap_or_default();
                form.push(name, value);
            }
        }
        Ok(form)
    }

    /// name 属性完全等于 `name` 的第一个 input
    pub fn input_named(&self, name: &str) -> Result<Option<Element<'a>>> {
        for input in self.find_all("input") {
            if input.attr("name")?.as_deref() == Some(name) {
                return Ok(Some(input));
            }
        }
        Ok(None)
    }
}

/// 从 `from` 开始查找 `pat`（如 `<td` 或 `</td`），要求其后紧跟标签名边界
fn find_tag(lower: &str, pat: &str, from: usize, limit: usize) -> Option<usize> {
    let mut pos = from;
    while pos < limit {
        let start = pos + lower[pos..limit].find(pat)?;
        let after = start + pat.len();
        match lower.as_bytes().get(after) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => return Some(start),
            _ => pos = after,
        }
    }
    None
}

/// 返回 (闭合标签起点, 闭合标签终点)
fn matching_close(lower: &str, tag: &str, from: usize, limit: usize) -> (usize, usize) {
    let open_pat = format!("<{}", tag);
    let close_pat = format!("</{}", tag);
    let mut depth = 1usize;
    let mut pos = from;
    loop {
        let next_open = find_tag(lower, &open_pat, pos, limit);
        let next_close = match find_tag(lower, &close_pat, pos, limit) {
            Some(c) => c,
            None => return (limit, limit),
        };
        match next_open {
            Some(o) if o < next_close => {
                depth += 1;
                pos = o + open_pat.len();
            }
            _ => {
                let end = lower[next_close..limit]
                    .find('>')
                    .map(|i| next_close + i + 1)
                    .unwrap_or(limit);
                depth -= 1;
                if depth == 0 {
                    return (next_close, end);
                }
                pos = end;
            }
        }
    }
}

/// 可省略闭合标签的元素：遇到自身闭合标签或同层的 `stops` 之一即结束，
/// 嵌套表格整体跳过
fn implied_close(
    lower: &str,
    tag: &str,
    stops: &[&str],
    from: usize,
    limit: usize,
) -> (usize, usize) {
    let close_pat = format!("</{}", tag);
    let mut pos = from;
    loop {
        let next = ["<table", close_pat.as_str()]
            .into_iter()
            .chain(stops.iter().copied())
            .filter_map(|pat| find_tag(lower, pat, pos, limit).map(|at| (at, pat)))
            .min_by_key(|(at, _)| *at);
        match next {
            None => return (limit, limit),
            Some((at, "<table")) => {
                let open_end = match lower[at..limit].find('>') {
                    Some(i) => at + i + 1,
                    None => return (limit, limit),
                };
                pos = matching_close(lower, "table", open_end, limit).1;
            }
            Some((at, pat)) if pat == close_pat => {
                let end = lower[at..limit]
                    .find('>')
                    .map(|i| at + i + 1)
                    .unwrap_or(limit);
                return (at, end);
            }
            Some((at, _)) => return (at, at),
        }
    }
}

/// 删除所有标签，只保留文字；每个标签换成一个空格，相邻单元格的文字不会粘连
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// 解码常见实体与数字实体
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let named = s
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'");
    decode_numeric(&named).replace("&amp;", "&")
}

fn decode_numeric(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(i) = rest.find("&#") {
        out.push_str(&rest[..i]);
        let tail = &rest[i + 2..];
        let decoded = tail.find(';').and_then(|semi| {
            let digits = &tail[..semi];
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => digits.parse::<u32>().ok(),
            };
            code.and_then(char::from_u32).map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push_str("&#");
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
