use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;

use crate::listing::Announcement;

/// Report column order as readers of these reports expect it.
pub const OUTPUT_COLUMNS: [&str; 12] = [
    "公告标题",
    "发布时间",
    "公告发布单位",
    "项目预算",
    "招标文件获取时间",
    "招标报名截止时间",
    "报名费用",
    "投标保证金",
    "项目类型",
    "项目地区",
    "公告类型",
    "详情链接",
];

/// Writes the crawl result as a timestamped CSV report.
pub struct CsvExporter {
    output_dir: PathBuf,
    file_prefix: String,
}

impl CsvExporter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> io::Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(CsvExporter {
            output_dir,
            file_prefix: "招标公告".to_string(),
        })
    }

    pub fn export(&self, items: &[Announcement]) -> Result<PathBuf, csv::Error> {
        let filename = format!(
            "{}_{}.csv",
            self.file_prefix,
            Local::now().format("%Y%m%d_%H%M%S")
        );
        let path = self.output_dir.join(filename);

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(OUTPUT_COLUMNS)?;
        for item in items {
            writer.write_record([
                &item.title,
                &item.publish_time,
                &item.publish_unit,
                &item.project_budget,
                &item.bid_file_time,
                &item.registration_deadline,
                &item.registration_fee,
                &item.bid_bond,
                &item.project_type,
                &item.region,
                &item.announcement_type,
                &item.detail_url,
            ])?;
        }
        writer.flush()?;

        info!("Wrote {} announcements to {}", items.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .subsec_nanos();
        std::env::temp_dir().join(format!("yfbzb_export_{}_{}", std::process::id(), nanos))
    }

    #[test]
    fn exports_header_and_rows() {
        let dir = temp_dir();
        let exporter = CsvExporter::new(&dir).unwrap();
        let announcement = Announcement {
            title: "无纸化会议系统采购".to_string(),
            publish_time: "2024/12/20".to_string(),
            region: "山东".to_string(),
            detail_url: "https://www.yfbzb.com/notice/123".to_string(),
            registration_fee: "0元/免费".to_string(),
            ..Announcement::default()
        };

        let path = exporter.export(&[announcement]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("公告标题,"));
        assert!(content.contains("无纸化会议系统采购"));
        assert!(content.contains("0元/免费"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn creates_missing_output_dir() {
        let dir = temp_dir().join("nested");
        assert!(!dir.exists());
        CsvExporter::new(&dir).unwrap();
        assert!(dir.exists());
        fs::remove_dir_all(dir.parent().unwrap()).unwrap();
    }
}
