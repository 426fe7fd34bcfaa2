use chrono::NaiveDateTime;
use log::{info, warn};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

use crate::dates::DateParser;
use crate::detail::DetailFields;

/// One row of the final report. Empty string means "not found"; the
/// enrichment fields stay empty until a detail fetch succeeds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Announcement {
    pub title: String,
    pub announcement_type: String,
    pub region: String,
    /// Raw display string as listed on the portal.
    pub publish_time: String,
    pub detail_url: String,
    pub publish_unit: String,
    pub project_budget: String,
    pub bid_file_time: String,
    pub registration_deadline: String,
    pub registration_fee: String,
    pub bid_bond: String,
    pub project_type: String,
}

impl Announcement {
    /// Folds detail-page fields into the record. A populated field is
    /// never overwritten with an empty match.
    pub fn merge_details(&mut self, details: &DetailFields) {
        fn fill(slot: &mut String, value: &str) {
            if !value.is_empty() {
                *slot = value.to_string();
            }
        }
        fill(&mut self.publish_unit, &details.publish_unit);
        fill(&mut self.project_budget, &details.project_budget);
        fill(&mut self.bid_file_time, &details.bid_file_time);
        fill(&mut self.registration_deadline, &details.registration_deadline);
        fill(&mut self.registration_fee, &details.registration_fee);
        fill(&mut self.bid_bond, &details.bid_bond);
        fill(&mut self.project_type, &details.project_type);
    }
}

/// Extracts announcement rows from a search-results page.
pub struct ListingParser {
    base_url: Url,
    page_size: usize,
    dates: DateParser,
    table_cascade: Vec<Selector>,
    row_selector: Selector,
    cell_selector: Selector,
    link_selector: Selector,
    pagination_selector: Selector,
    anchor_selector: Selector,
}

impl ListingParser {
    pub fn new(base_url: &str, page_size: usize) -> Self {
        ListingParser {
            base_url: Url::parse(base_url).expect("invalid base URL"),
            page_size,
            dates: DateParser::new(),
            // Tried in order; tolerates the portal shuffling markup.
            table_cascade: vec![
                Selector::parse("table#treeTable").unwrap(),
                Selector::parse("table.table-hover").unwrap(),
                Selector::parse("table").unwrap(),
            ],
            row_selector: Selector::parse("tr").unwrap(),
            cell_selector: Selector::parse("td").unwrap(),
            link_selector: Selector::parse("a").unwrap(),
            pagination_selector: Selector::parse("ul.pagination").unwrap(),
            anchor_selector: Selector::parse("a").unwrap(),
        }
    }

    /// Returns the in-range records on this page and whether pagination
    /// should continue. Rows are scanned top-down (newest first); the
    /// first row older than `cutoff` ends the scan and the whole crawl
    /// for this keyword.
    pub fn parse_page(&self, html: &str, cutoff: NaiveDateTime) -> (Vec<Announcement>, bool) {
        let document = Html::parse_document(html);

        let table = self
            .table_cascade
            .iter()
            .find_map(|selector| document.select(selector).next());
        let table = match table {
            Some(table) => table,
            None => {
                warn!("Listing table not found; the site layout may have changed");
                return (Vec::new(), false);
            }
        };

        let rows: Vec<ElementRef> = table.select(&self.row_selector).collect();
        let mut records = Vec::new();

        // First row is the header.
        for row in rows.iter().skip(1) {
            let cells: Vec<ElementRef> = row.select(&self.cell_selector).collect();
            if cells.len() < 4 {
                continue;
            }

            let (title, detail_url) = self.title_and_link(&cells[0]);
            let announcement_type = cell_text(&cells[1]);
            let region = cell_text(&cells[2]);
            let publish_time = cell_text(&cells[3]);

            if let Some(date) = self.dates.parse(&publish_time) {
                if date < cutoff {
                    info!("Hit announcement outside the time window: {}", publish_time);
                    return (records, false);
                }
            }

            records.push(Announcement {
                title,
                announcement_type,
                region,
                publish_time,
                detail_url,
                ..Announcement::default()
            });
        }

        let mut has_more = document.select(&self.pagination_selector).next().is_some()
            || document
                .select(&self.anchor_selector)
                .any(|a| a.text().any(|t| t.contains("下一页")));

        // A full page probably has a successor even when no pagination
        // control could be parsed.
        if rows.len().saturating_sub(1) >= self.page_size {
            has_more = true;
        }

        (records, has_more)
    }

    fn title_and_link(&self, cell: &ElementRef) -> (String, String) {
        match cell.select(&self.link_selector).next() {
            Some(link) => {
                let title = cell_text(&link);
                let detail_url = match link.value().attr("href") {
                    Some(href) if !href.is_empty() && !href.starts_with("http") => self
                        .base_url
                        .join(href)
                        .map(|u| u.to_string())
                        .unwrap_or_default(),
                    Some(href) => href.to_string(),
                    None => String::new(),
                };
                (title, detail_url)
            }
            None => (cell_text(cell), String::new()),
        }
    }
}

fn cell_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const BASE: &str = "https://www.yfbzb.com";

    fn cutoff(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn page_with_rows(rows: &str) -> String {
        format!(
            "<html><body><table id=\"treeTable\">\
             <tr><th>标题</th><th>类型</th><th>地区</th><th>发布时间</th></tr>\
             {rows}</table></body></html>"
        )
    }

    fn row(title: &str, href: &str, date: &str) -> String {
        format!(
            "<tr><td><a href=\"{href}\">{title}</a></td>\
             <td>招标公告</td><td>山东</td><td>{date}</td></tr>"
        )
    }

    #[test]
    fn stops_at_first_row_older_than_cutoff() {
        // Simulated "now" of 2024-12-21 with a 48h window.
        let parser = ListingParser::new(BASE, 30);
        let html = page_with_rows(&format!(
            "{}{}",
            row("会议系统采购", "/notice/1", "2024/12/20"),
            row("旧公告", "/notice/2", "2024/01/01"),
        ));
        let (records, has_more) = parser.parse_page(&html, cutoff(2024, 12, 19));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "会议系统采购");
        assert!(!has_more);
    }

    #[test]
    fn keeps_rows_with_unparseable_dates() {
        let parser = ListingParser::new(BASE, 30);
        let html = page_with_rows(&row("日期待定的公告", "/notice/9", "待定"));
        let (records, _) = parser.parse_page(&html, cutoff(2030, 1, 1));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].publish_time, "待定");
    }

    #[test]
    fn resolves_relative_detail_links() {
        let parser = ListingParser::new(BASE, 30);
        let html = page_with_rows(&row("公告", "/notice/123", "2024/12/20"));
        let (records, _) = parser.parse_page(&html, cutoff(2024, 12, 19));
        assert_eq!(records[0].detail_url, "https://www.yfbzb.com/notice/123");
    }

    #[test]
    fn keeps_absolute_detail_links() {
        let parser = ListingParser::new(BASE, 30);
        let html = page_with_rows(&row("公告", "https://other.example/n/1", "2024/12/20"));
        let (records, _) = parser.parse_page(&html, cutoff(2024, 12, 19));
        assert_eq!(records[0].detail_url, "https://other.example/n/1");
    }

    #[test]
    fn missing_table_is_an_empty_page() {
        let parser = ListingParser::new(BASE, 30);
        let (records, has_more) =
            parser.parse_page("<html><body><p>维护中</p></body></html>", cutoff(2024, 1, 1));
        assert!(records.is_empty());
        assert!(!has_more);
    }

    #[test]
    fn skips_rows_with_too_few_cells() {
        let parser = ListingParser::new(BASE, 30);
        let html = page_with_rows(
            "<tr><td>残缺行</td><td>x</td></tr>\
             <tr><td><a href=\"/n/1\">完整行</a></td><td>t</td><td>r</td><td>2024/12/20</td></tr>",
        );
        let (records, _) = parser.parse_page(&html, cutoff(2024, 12, 19));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "完整行");
    }

    #[test]
    fn full_page_signals_more() {
        let parser = ListingParser::new(BASE, 2);
        let html = page_with_rows(&format!(
            "{}{}",
            row("a", "/n/1", "2024/12/20"),
            row("b", "/n/2", "2024/12/20"),
        ));
        let (records, has_more) = parser.parse_page(&html, cutoff(2024, 12, 19));
        assert_eq!(records.len(), 2);
        assert!(has_more);
    }

    #[test]
    fn short_page_without_pagination_ends_crawl() {
        let parser = ListingParser::new(BASE, 30);
        let html = page_with_rows(&row("a", "/n/1", "2024/12/20"));
        let (_, has_more) = parser.parse_page(&html, cutoff(2024, 12, 19));
        assert!(!has_more);
    }

    #[test]
    fn pagination_control_signals_more() {
        let parser = ListingParser::new(BASE, 30);
        let html = format!(
            "{}<ul class=\"pagination\"><li>1</li></ul>",
            page_with_rows(&row("a", "/n/1", "2024/12/20"))
        );
        let (_, has_more) = parser.parse_page(&html, cutoff(2024, 12, 19));
        assert!(has_more);
    }

    #[test]
    fn next_page_anchor_signals_more() {
        let parser = ListingParser::new(BASE, 30);
        let html = format!(
            "{}<a href=\"#\">下一页</a>",
            page_with_rows(&row("a", "/n/1", "2024/12/20"))
        );
        let (_, has_more) = parser.parse_page(&html, cutoff(2024, 12, 19));
        assert!(has_more);
    }

    #[test]
    fn merge_never_clears_populated_fields() {
        let mut announcement = Announcement {
            publish_unit: "某单位".to_string(),
            ..Announcement::default()
        };
        let details = DetailFields {
            project_budget: "500元".to_string(),
            ..DetailFields::default()
        };
        announcement.merge_details(&details);
        assert_eq!(announcement.publish_unit, "某单位");
        assert_eq!(announcement.project_budget, "500元");
    }
}
