//! 表单 / 表格抽取服务 - 业务能力层
//!
//! 只负责"从页面中取数据"的能力，不发请求、不关心流程。
//!
//! 门户页面没有稳定的 id 或 class，只能按出现顺序定位表单、表格和列。
//! 所有位置下标都集中在本文件顶部，页面改版时只需修改这里。

use crate::error::{AppError, Result};
use crate::models::endpoints::join_url;
use crate::models::markers::{FILLED, HEADER_COURSE_NAME};
use crate::models::{
    CourseRecord, CourseToken, FormData, Questionnaire, SeatStatus, TaForm, TaQuestionnaire,
};
use crate::utils::html::{Document, Element};
use serde::Serialize;

// ========== 位置常量 ==========

/// 课程行中选课号码所在列
pub const CODE_COLUMN: usize = 1;
/// 选课号码确认页中"可选人数"所在列
pub const SEAT_AVAILABLE_COLUMN: usize = 8;
/// 选课号码确认页中"已选人数"所在列
pub const SEAT_SELECTED_COLUMN: usize = 9;

/// 通识加选结果：第 6 个表格的第 12 个单元格
pub const GE_FINAL_TABLE: usize = 5;
pub const GE_FINAL_CELL: usize = 11;
/// 系所加选结果：第 7 个表格的第 8 个单元格
pub const ACAD_FINAL_TABLE: usize = 6;
pub const ACAD_FINAL_CELL: usize = 7;
/// 退选结果：第 2 个表格的第 7 个单元格
pub const DROP_FINAL_TABLE: usize = 1;
pub const DROP_FINAL_CELL: usize = 6;
/// 选课号码加选结果：第 1 个表格每行（末行除外）的第 8 列
pub const DIRECT_FINAL_TABLE: usize = 0;
pub const DIRECT_FINAL_COLUMN: usize = 7;

/// 问卷列表所在表格
pub const QUES_TABLE: usize = 2;
/// 填答链接所在列
pub const QUES_LINK_COLUMN: usize = 9;
/// 完成标记（图片）所在列
pub const QUES_DONE_COLUMN: usize = 10;

/// TA 问卷列表所在表格
pub const TA_TABLE: usize = 2;
/// 每位 TA 一个表单，全部位于该列
pub const TA_FORMS_COLUMN: usize = 7;

/// 通识课程列表分布在这三个表格中
pub const GE_LISTING_TABLES: [usize; 3] = [6, 8, 10];

/// 列表页角色，决定课程表单是页面中的第几个 form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormRole {
    /// 通识加选
    Ge,
    /// 系所必选修加选
    Acad,
    /// 选课号码加选
    Code,
    /// 退选
    Drop,
}

impl FormRole {
    pub const fn form_index(self) -> usize {
        match self {
            FormRole::Ge => 1,
            FormRole::Acad => 1,
            FormRole::Code => 0,
            FormRole::Drop => 0,
        }
    }
}

/// 最终结果页类型（单门课程）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalPage {
    Ge,
    Acad,
    Drop,
}

impl FinalPage {
    /// (表格下标, 单元格下标)
    pub const fn position(self) -> (usize, usize) {
        match self {
            FinalPage::Ge => (GE_FINAL_TABLE, GE_FINAL_CELL),
            FinalPage::Acad => (ACAD_FINAL_TABLE, ACAD_FINAL_CELL),
            FinalPage::Drop => (DROP_FINAL_TABLE, DROP_FINAL_CELL),
        }
    }
}

/// 课程表单中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseRow {
    pub cells: Vec<String>,
    #[serde(skip)]
    pub token: Option<CourseToken>,
}

impl CourseRow {
    pub fn code(&self) -> Option<&str> {
        self.cells.get(CODE_COLUMN).map(String::as_str)
    }

    /// 解析名额列
    pub fn seat_status(&self) -> Result<SeatStatus> {
        let code = self.code().unwrap_or_default().to_string();
        Ok(SeatStatus {
            available: parse_count(&self.cells, SEAT_AVAILABLE_COLUMN, &code)?,
            selected: parse_count(&self.cells, SEAT_SELECTED_COLUMN, &code)?,
            code,
        })
    }
}

/// 列表页中的课程表单
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CourseTable {
    pub rows: Vec<CourseRow>,
}

impl CourseTable {
    pub fn row_for_code(&self, code: &str) -> Option<&CourseRow> {
        self.rows.iter().find(|row| row.code() == Some(code))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 按页面角色取出课程表单，每个含 `td` 的 `tr` 成为一行
pub fn extract_table(html: &str, role: FormRole) -> Result<CourseTable> {
    let doc = Document::parse(html);
    let index = role.form_index();
    let form = doc.nth("form", index).ok_or_else(|| {
        AppError::parse(format!("页面中找不到第 {} 个表单 ({:?})", index + 1, role))
    })?;

    let mut rows = Vec::new();
    for tr in form.find_all("tr") {
        let cells: Vec<String> = tr.find_all("td").iter().map(Element::text).collect();
        if cells.is_empty() {
            continue;
        }
        let token = match tr.find("input") {
            Some(input) => input.attr("value")?.map(CourseToken::new),
            None => None,
        };
        rows.push(CourseRow { cells, token });
    }
    Ok(CourseTable { rows })
}

/// 查找选课号码对应行的隐藏字段值；找不到返回 `None`
pub fn token_for_row(table: &CourseTable, code: &str) -> Option<CourseToken> {
    table.row_for_code(code).and_then(|row| row.token.clone())
}

/// 查找选课号码对应行的名额；找不到返回 `None`
pub fn seat_status_for_row(table: &CourseTable, code: &str) -> Result<Option<SeatStatus>> {
    table.row_for_code(code).map(CourseRow::seat_status).transpose()
}

/// 单门课程结果页中的消息文字
pub fn final_message(html: &str, page: FinalPage) -> Result<String> {
    let (table_index, cell_index) = page.position();
    let doc = Document::parse(html);
    let table = doc
        .nth("table", table_index)
        .ok_or_else(|| AppError::parse(format!("结果页缺少第 {} 个表格", table_index + 1)))?;
    table
        .nth("td", cell_index)
        .map(|td| td.text())
        .ok_or_else(|| AppError::parse(format!("结果表格缺少第 {} 个单元格", cell_index + 1)))
}

/// 选课号码加选结果页中每门课程的消息，顺序与提交顺序一致
pub fn direct_final_messages(html: &str) -> Result<Vec<String>> {
    let doc = Document::parse(html);
    let table = doc
        .nth("table", DIRECT_FINAL_TABLE)
        .ok_or_else(|| AppError::parse("结果页缺少结果表格"))?;
    let rows = table.find_all("tr");
    let mut messages = Vec::new();
    // 最后一行是说明文字
    for tr in rows.iter().take(rows.len().saturating_sub(1)) {
        let cells = tr.find_all("td");
        if cells.is_empty() {
            continue;
        }
        let cell = cells.get(DIRECT_FINAL_COLUMN).ok_or_else(|| {
            AppError::parse(format!("结果行缺少第 {} 列", DIRECT_FINAL_COLUMN + 1))
        })?;
        messages.push(cell.text());
    }
    Ok(messages)
}

/// 通识确认页中需要回传的 `v_click`
pub fn ge_confirm_code(html: &str) -> Result<String> {
    let doc = Document::parse(html);
    let input = doc
        .root()
        .input_named("v_click")?
        .ok_or_else(|| AppError::parse("确认页缺少 v_click"))?;
    Ok(input.attr("value")?.unwrap_or_default())
}

/// 通识课程列表（三个表格合并）
pub fn parse_ge_listing(html: &str) -> Result<Vec<CourseRecord>> {
    let doc = Document::parse(html);
    let mut records = Vec::new();
    for table_index in GE_LISTING_TABLES {
        let table = doc
            .nth("table", table_index)
            .ok_or_else(|| AppError::parse(format!("通识列表缺少第 {} 个表格", table_index + 1)))?;
        for tr in table.find_all("tr") {
            let cells: Vec<String> = tr.find_all("td").iter().map(Element::text).collect();
            if let Some(code) = cells.get(CODE_COLUMN) {
                records.push(CourseRecord {
                    code: code.clone(),
                    cells,
                });
            }
        }
    }
    Ok(records)
}

/// 期末问卷列表
///
/// `list_url` 用于把相对链接转为绝对地址。
pub fn parse_questionnaires(html: &str, list_url: &str) -> Result<Vec<Questionnaire>> {
    let doc = Document::parse(html);
    let table = doc
        .nth("table", QUES_TABLE)
        .ok_or_else(|| AppError::parse("问卷列表缺少问卷表格"))?;
    let headers = table_headers(&table);

    let mut results = Vec::new();
    for tr in table.find_all("tr") {
        let cells = tr.find_all("td");
        if cells.is_empty() {
            continue;
        }
        let columns: Vec<(String, String)> = headers
            .iter()
            .cloned()
            .zip(cells.iter().map(Element::text))
            .collect();

        let course_name = columns
            .iter()
            .find(|(h, _)| h == HEADER_COURSE_NAME)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| AppError::parse(format!("问卷表格缺少「{}」列", HEADER_COURSE_NAME)))?;

        let fill_url = match cells.get(QUES_LINK_COLUMN).and_then(|td| td.find("a")) {
            Some(link) => match link.attr("href")? {
                Some(href) => Some(join_url(list_url, &href)?),
                None => None,
            },
            None => None,
        };
        let completed = cells
            .get(QUES_DONE_COLUMN)
            .map(|td| td.contains_tag("img"))
            .unwrap_or(false);

        results.push(Questionnaire {
            columns,
            course_name,
            fill_url,
            completed,
        });
    }
    Ok(results)
}

/// TA 服务意见调查列表
pub fn parse_ta_questionnaires(html: &str) -> Result<Vec<TaQuestionnaire>> {
    let doc = Document::parse(html);
    let table = doc
        .nth("table", TA_TABLE)
        .ok_or_else(|| AppError::parse("TA 问卷列表缺少问卷表格"))?;
    let headers = table_headers(&table);

    let mut results = Vec::new();
    for tr in table.find_all("tr") {
        let cells = tr.find_all("td");
        if cells.is_empty() {
            continue;
        }
        let mut columns = Vec::new();
        let mut forms = Vec::new();
        for (index, (header, td)) in headers.iter().zip(cells.iter()).enumerate() {
            if index == TA_FORMS_COLUMN {
                for form in td.find_all("form") {
                    forms.push(TaForm {
                        fields: form.hidden_fields()?,
                        completed: form.text().contains(FILLED),
                    });
                }
            } else {
                columns.push((header.clone(), td.text()));
            }
        }
        results.push(TaQuestionnaire { columns, forms });
    }
    Ok(results)
}

/// 问卷填答页的第一个表单
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillForm {
    /// 隐藏字段
    pub hidden: FormData,
    /// 单选题名称（去重）
    pub radios: Vec<String>,
    /// 文本框名称
    pub texts: Vec<String>,
    /// 多行文本框名称
    pub textareas: Vec<String>,
}

pub fn parse_fill_form(html: &str) -> Result<FillForm> {
    let doc = Document::parse(html);
    let form = doc
        .find("form")
        .ok_or_else(|| AppError::parse("填答页缺少表单"))?;
    let mut textareas = Vec::new();
    for area in form.find_all("textarea") {
        if let Some(name) = area.attr("name")? {
            textareas.push(name);
        }
    }
    Ok(FillForm {
        hidden: form.hidden_fields()?,
        radios: form.input_names_of_type("radio")?,
        texts: form.input_names_of_type("text")?,
        textareas,
    })
}

/// 页面第一个表单的隐藏字段
pub fn first_form_hidden_fields(html: &str) -> Result<FormData> {
    let doc = Document::parse(html);
    let form = doc
        .find("form")
        .ok_or_else(|| AppError::parse("页面缺少表单"))?;
    form.hidden_fields()
}

/// 页面第一个表单的 action 与隐藏字段
pub fn first_form_action(html: &str) -> Result<(String, FormData)> {
    let doc = Document::parse(html);
    let form = doc
        .find("form")
        .ok_or_else(|| AppError::parse("页面缺少表单"))?;
    let action = form
        .attr("action")?
        .ok_or_else(|| AppError::parse("表单缺少 action"))?;
    Ok((action, form.hidden_fields()?))
}

fn table_headers(table: &Element<'_>) -> Vec<String> {
    table.find_all("th").iter().map(Element::text).collect()
}

fn parse_count(cells: &[String], column: usize, code: &str) -> Result<u32> {
    let raw = cells
        .get(column)
        .ok_or_else(|| AppError::parse(format!("课程 {} 缺少第 {} 列", code, column + 1)))?;
    raw.trim()
        .parse()
        .map_err(|_| AppError::parse(format!("课程 {} 第 {} 列不是数字: {}", code, column + 1, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course_row(code: &str, token: &str, available: u32, selected: u32) -> String {
        format!(
            "<tr><td><input type=checkbox name=v_tick value=\"{token}\"></td><td>{code}</td>\
             <td>課程</td><td>3</td><td>必</td><td>甲</td><td>一234</td><td>教師</td>\
             <td>{available}</td><td>{selected}</td></tr>"
        )
    }

    fn code_page(rows: &[String]) -> String {
        format!(
            "<html><body><form method=post><table><tr><th>選</th><th>號碼</th></tr>{}</table></form>\
             <form><input type=submit></form></body></html>",
            rows.concat()
        )
    }

    #[test]
    fn test_form_role_indices() {
        assert_eq!(FormRole::Ge.form_index(), 1);
        assert_eq!(FormRole::Acad.form_index(), 1);
        assert_eq!(FormRole::Code.form_index(), 0);
        assert_eq!(FormRole::Drop.form_index(), 0);
    }

    #[test]
    fn test_token_for_row_found_and_missing() {
        let html = code_page(&[
            course_row("0348", "SECRET-A", 60, 60),
            course_row("0349", "SECRET-B", 60, 59),
        ]);
        let table = extract_table(&html, FormRole::Code).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            token_for_row(&table, "0349").map(|t| t.as_str().to_string()),
            Some("SECRET-B".to_string())
        );
        assert_eq!(token_for_row(&table, "9999"), None);
    }

    #[test]
    fn test_missing_form_is_parse_error() {
        let html = code_page(&[course_row("0348", "A", 1, 0)]);
        // 页面只有两个表单，第 2 个表单里没有课程行
        let table = extract_table(&html, FormRole::Ge).unwrap();
        assert!(table.is_empty());
        let err = extract_table("<html></html>", FormRole::Code).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[test]
    fn test_seat_status_columns() {
        let html = code_page(&[course_row("1159", "T", 5, 2)]);
        let table = extract_table(&html, FormRole::Code).unwrap();
        let seats = seat_status_for_row(&table, "1159").unwrap().unwrap();
        assert_eq!(seats.available, 5);
        assert_eq!(seats.selected, 2);
        assert!(seats.has_vacancy());
        assert!(seat_status_for_row(&table, "0000").unwrap().is_none());
    }

    #[test]
    fn test_direct_final_messages_skip_trailer_row() {
        let row = |msg: &str| {
            format!(
                "<tr>{}<td>{}</td></tr>",
                "<td>x</td>".repeat(DIRECT_FINAL_COLUMN),
                msg
            )
        };
        let html = format!(
            "<table>{}{}<tr><td colspan=8>說明</td></tr></table>",
            row("加選成功"),
            row("人數已滿")
        );
        assert_eq!(
            direct_final_messages(&html).unwrap(),
            vec!["加選成功".to_string(), "人數已滿".to_string()]
        );
    }

    #[test]
    fn test_final_message_position() {
        let filler = "<table><tr><td>-</td></tr></table>";
        let cells: String = (0..DROP_FINAL_CELL)
            .map(|i| format!("<td>c{}</td>", i))
            .collect();
        let html = format!(
            "{}<table><tr>{}<td> 退選成功 </td></tr></table>",
            filler, cells
        );
        assert_eq!(final_message(&html, FinalPage::Drop).unwrap(), "退選成功");
        assert!(final_message(&html, FinalPage::Ge).is_err());
    }

    #[test]
    fn test_rows_without_closing_cell_tags() {
        let html = code_page(&[
            "<tr><td><input type=checkbox name=v_tick value=\"SECRET-A\"><td>0348<td>課程\
             <td>3<td>必<td>甲<td>一234<td>教師<td>60<td>59</tr>"
                .to_string(),
            course_row("0349", "SECRET-B", 60, 60),
        ]);
        let table = extract_table(&html, FormRole::Code).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].cells[CODE_COLUMN], "0348");
        assert_eq!(
            token_for_row(&table, "0348").map(|t| t.as_str().to_string()),
            Some("SECRET-A".to_string())
        );
        let seats = seat_status_for_row(&table, "0348").unwrap().unwrap();
        assert_eq!((seats.available, seats.selected), (60, 59));
    }

    #[test]
    fn test_ge_listing_reads_only_listing_tables() {
        let html: String = (0..11)
            .map(|i| {
                if GE_LISTING_TABLES.contains(&i) {
                    format!(
                        "<table><tr><th>選</th><th>號碼</th></tr>{}{}</table>",
                        course_row(&format!("{}1", i), "T", 1, 0),
                        course_row(&format!("{}2", i), "T", 1, 1)
                    )
                } else {
                    format!("<table><tr><td>x</td><td>X{}</td></tr></table>", i)
                }
            })
            .collect();
        let records = parse_ge_listing(&html).unwrap();
        let codes: Vec<_> = records.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["61", "62", "81", "82", "101", "102"]);
        assert_eq!(records[0].cells.len(), 10);
        assert_eq!(records[0].cells[2], "課程");
    }

    #[test]
    fn test_ge_listing_missing_table_is_parse_error() {
        let html = "<table><tr><td>1</td><td>2</td></tr></table>".repeat(10);
        let err = parse_ge_listing(&html).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[test]
    fn test_parse_fill_form() {
        let html = r#"<form action="Stud_Question_Conf3" method=post>
            <input type=hidden name=v_key value="K1">
            <input type=radio name=v_A1 value=1><input type=radio name=v_A1 value=2>
            <input type=radio name=v_B10 value=1>
            <input type=text name=v_memo>
            <textarea name=v_sugg></textarea>
        </form>"#;
        let form = parse_fill_form(html).unwrap();
        assert_eq!(form.hidden.get("v_key"), Some("K1"));
        assert_eq!(form.radios, vec!["v_A1", "v_B10"]);
        assert_eq!(form.texts, vec!["v_memo"]);
        assert_eq!(form.textareas, vec!["v_sugg"]);
    }
}
