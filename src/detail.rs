use regex::Regex;
use scraper::{Html, Selector};

/// The seven semi-structured fields recovered from a detail page.
/// Empty string means the field was not found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub publish_unit: String,
    pub project_budget: String,
    pub bid_file_time: String,
    pub registration_deadline: String,
    pub registration_fee: String,
    pub bid_bond: String,
    pub project_type: String,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    PublishUnit,
    ProjectBudget,
    BidFileTime,
    RegistrationDeadline,
    RegistrationFee,
    BidBond,
    ProjectType,
}

impl DetailFields {
    fn set(&mut self, slot: Slot, value: String) {
        match slot {
            Slot::PublishUnit => self.publish_unit = value,
            Slot::ProjectBudget => self.project_budget = value,
            Slot::BidFileTime => self.bid_file_time = value,
            Slot::RegistrationDeadline => self.registration_deadline = value,
            Slot::RegistrationFee => self.registration_fee = value,
            Slot::BidBond => self.bid_bond = value,
            Slot::ProjectType => self.project_type = value,
        }
    }
}

/// Post-processing applied to a captured value.
#[derive(Debug, Clone, Copy)]
enum Normalize {
    /// Free text: strip masking, optionally truncate. A value that
    /// cleans down to nothing rejects the match and the cascade moves
    /// on to the next pattern.
    Text { max_len: Option<usize> },
    /// Numeric amount, suffixed with 元.
    Money,
    /// Amount, but 0 becomes an explicit "free" marker.
    Fee,
    /// Positive amount only; a zero bond is not a bond.
    Bond,
}

impl Normalize {
    /// Money-like fields take whatever the first matching pattern
    /// captured; a rejected value still ends the cascade.
    fn is_final(self) -> bool {
        matches!(self, Normalize::Money | Normalize::Fee | Normalize::Bond)
    }
}

struct FieldRule {
    slot: Slot,
    patterns: Vec<Regex>,
    normalize: Normalize,
}

/// Applies ordered regex cascades over a detail page's plain text.
/// First matching pattern per field wins; extraction never fails, it
/// degrades to empty fields.
pub struct DetailExtractor {
    container_cascade: Vec<Selector>,
    rules: Vec<FieldRule>,
    mask: Regex,
    login_hint: Regex,
}

impl Default for DetailExtractor {
    fn default() -> Self {
        DetailExtractor::new()
    }
}

impl DetailExtractor {
    pub fn new() -> Self {
        let rule = |slot, patterns: &[&str], normalize| FieldRule {
            slot,
            patterns: patterns
                .iter()
                .map(|p| Regex::new(p).unwrap())
                .collect(),
            normalize,
        };

        DetailExtractor {
            container_cascade: vec![
                Selector::parse("div.detail-content").unwrap(),
                Selector::parse("div.content").unwrap(),
            ],
            rules: vec![
                rule(
                    Slot::PublishUnit,
                    &[
                        r"(?:采购单位|招标单位|发布单位|项目单位|采购人)[：:]\s*([^\n\r]+)",
                        r"企\s*业[：:]\s*([^\n\r]+)",
                    ],
                    Normalize::Text { max_len: None },
                ),
                rule(
                    Slot::ProjectBudget,
                    &[
                        r"(?:项目预算|预算金额|采购预算|预算)[：:]\s*([\d,.]+)\s*(?:万)?元",
                        r"(?:总投资|投资额|合同金额)[：:]\s*([\d,.]+)\s*(?:万)?元",
                    ],
                    Normalize::Money,
                ),
                rule(
                    Slot::BidFileTime,
                    &[
                        r"(?:采购文件|招标文件)(?:.*?)(?:获取|下载)(?:.*?)(?:时间|日期)[：:]\s*([^\n\r]+)",
                        r"(?:文件获取时间|获取招标文件时间)[：:]\s*([^\n\r]+)",
                        r"获取时间[：:]\s*([^\n\r]+)",
                    ],
                    Normalize::Text { max_len: Some(100) },
                ),
                rule(
                    Slot::RegistrationDeadline,
                    &[
                        r"(?:报名截止|投标截止|报价截止)(?:时间|日期)?[：:]\s*([^\n\r]+)",
                        r"(?:截止时间|截止日期)[：:]\s*([^\n\r]+)",
                        r"报名.*?(?:至|到)\s*(\d{4}[/\-年]\d{1,2}[/\-月]\d{1,2}[日]?\s*\d{1,2}[：:]\d{1,2})",
                    ],
                    Normalize::Text { max_len: Some(100) },
                ),
                rule(
                    Slot::RegistrationFee,
                    &[
                        r"(?:报名费|标书费|招标文件费|资料费)[：:]\s*([\d,.]+)\s*元?",
                        r"(?:报名费|标书费)[：:]\s*(?:人民币)?\s*([\d,.]+)",
                    ],
                    Normalize::Fee,
                ),
                rule(
                    Slot::BidBond,
                    &[
                        r"(?:投标保证金|保证金金额|保证金)[：:]\s*([\d,.]+)(?:\s*元)?",
                        r"保证金[：:]\s*(?:人民币)?\s*([\d,.]+)",
                    ],
                    Normalize::Bond,
                ),
                rule(
                    Slot::ProjectType,
                    &[
                        r"(?:项目类型|采购类型|招标类型)[：:]\s*([^\n\r]+)",
                        r"(?:采购方式|招标方式)[：:]\s*([^\n\r]+)",
                    ],
                    Normalize::Text { max_len: Some(50) },
                ),
            ],
            mask: Regex::new(r"\*+").unwrap(),
            login_hint: Regex::new(r"\*+|点击登录查看").unwrap(),
        }
    }

    pub fn extract(&self, html: &str) -> DetailFields {
        let document = Html::parse_document(html);

        // Content container cascade; fall back to the whole document.
        let text = self
            .container_cascade
            .iter()
            .find_map(|selector| document.select(selector).next())
            .map(|el| el.text().collect::<String>())
            .unwrap_or_else(|| document.root_element().text().collect());

        let mut fields = DetailFields::default();
        for rule in &self.rules {
            for pattern in &rule.patterns {
                if let Some(caps) = pattern.captures(&text) {
                    let raw = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
                    if let Some(value) = self.normalize(rule.slot, rule.normalize, raw) {
                        fields.set(rule.slot, value);
                        break;
                    }
                    if rule.normalize.is_final() {
                        break;
                    }
                }
            }
        }
        fields
    }

    fn normalize(&self, slot: Slot, normalize: Normalize, raw: &str) -> Option<String> {
        match normalize {
            Normalize::Text { max_len } => {
                // The unit field is the one hidden behind a login wall.
                let masked = match slot {
                    Slot::PublishUnit => &self.login_hint,
                    _ => &self.mask,
                };
                let cleaned = masked.replace_all(raw, "");
                let cleaned = cleaned.trim();
                if cleaned.is_empty() {
                    return None;
                }
                Some(match max_len {
                    Some(max) if cleaned.chars().count() > max => {
                        cleaned.chars().take(max).collect()
                    }
                    _ => cleaned.to_string(),
                })
            }
            Normalize::Money => Some(format!("{raw}元")),
            Normalize::Fee => {
                if raw != "0" {
                    Some(format!("{raw}元"))
                } else {
                    Some("0元/免费".to_string())
                }
            }
            Normalize::Bond => {
                let amount: f64 = raw.replace(',', "").parse().ok()?;
                if amount > 0.0 {
                    Some(format!("{raw}元"))
                } else {
                    None
                }
            }
        }
    }
}
