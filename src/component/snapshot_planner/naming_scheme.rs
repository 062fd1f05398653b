pub const SNAPSHOT_PREFIX: &str = "img";
pub const SNAPSHOT_EXTENSION: &str = "jpg";

/// 截圖檔名樣板，序號補零到與總數相同的位數，字典序即時間順序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingTemplate {
    pub digit_width: usize,
    /// 交給 ffmpeg image2 muxer 的樣板，例如 `img-%02d.jpg`
    pub pattern: String,
}

impl NamingTemplate {
    #[must_use]
    pub fn for_count(count: u32) -> Self {
        let digit_width = count.max(1).ilog10() as usize + 1;
        Self {
            digit_width,
            pattern: format!("{SNAPSHOT_PREFIX}-%0{digit_width}d.{SNAPSHOT_EXTENSION}"),
        }
    }

    /// 第 `index` 張截圖的檔名（從 1 開始，與 ffmpeg 相同）
    #[must_use]
    pub fn file_name(&self, index: u32) -> String {
        format!(
            "{SNAPSHOT_PREFIX}-{index:0width$}.{SNAPSHOT_EXTENSION}",
            width = self.digit_width
        )
    }

    pub fn file_names(&self, count: u32) -> impl Iterator<Item = String> + '_ {
        (1..=count).map(|index| self.file_name(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_width() {
        let widths: Vec<usize> = [1, 9, 10, 60, 100]
            .iter()
            .map(|&count| NamingTemplate::for_count(count).digit_width)
            .collect();
        assert_eq!(widths, vec![1, 1, 2, 2, 3]);
    }

    #[test]
    fn test_pattern() {
        assert_eq!(NamingTemplate::for_count(60).pattern, "img-%02d.jpg");
        assert_eq!(NamingTemplate::for_count(300).pattern, "img-%03d.jpg");
        assert_eq!(NamingTemplate::for_count(0).pattern, "img-%01d.jpg");
    }

    #[test]
    fn test_file_names() {
        let template = NamingTemplate::for_count(60);
        assert_eq!(template.file_name(1), "img-01.jpg");
        assert_eq!(template.file_name(60), "img-60.jpg");
    }

    #[test]
    fn test_lexicographic_order_matches_numeric_order() {
        for count in [1, 9, 10, 60, 100, 1234] {
            let template = NamingTemplate::for_count(count);
            let names: Vec<String> = template.file_names(count).collect();
            let mut sorted = names.clone();
            sorted.sort();
            assert_eq!(names, sorted, "count={count}");
            assert_eq!(names.len(), count as usize);
        }
    }
}
