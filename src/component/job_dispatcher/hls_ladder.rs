use crate::tools::StreamLayout;

/// HLS 的一個畫質版本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Representation {
    pub width: u32,
    pub height: u32,
    pub video_kbps: u32,
    pub audio_kbps: u32,
}

impl Representation {
    /// 用於 `var_stream_map` 的名稱，也會出現在子播放清單檔名
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}p", self.height)
    }
}

/// 標準畫質階梯：(高度, 視訊 kbps, 音訊 kbps)
const STANDARD_LADDER: [(u32, u32, u32); 8] = [
    (144, 95, 64),
    (240, 150, 64),
    (360, 276, 96),
    (480, 750, 96),
    (720, 2048, 128),
    (1080, 4096, 192),
    (1440, 6144, 192),
    (2160, 17408, 320),
];

fn even(value: f64) -> u32 {
    ((value / 2.0).round() as u32 * 2).max(2)
}

/// 依來源解析度自動產生畫質版本
///
/// 第一個版本使用來源解析度，其後依序為低於來源高度的標準畫質，
/// 寬度依來源比例換算並取偶數。
#[must_use]
pub fn auto_representations(source: &StreamLayout) -> Vec<Representation> {
    let source_height = (source.height & !1).max(2);
    let source_width = (source.width & !1).max(2);
    let aspect = f64::from(source.width.max(1)) / f64::from(source.height.max(1));

    let (_, top_video, top_audio) = STANDARD_LADDER
        .iter()
        .copied()
        .find(|(height, _, _)| *height >= source_height)
        .unwrap_or(STANDARD_LADDER[STANDARD_LADDER.len() - 1]);

    let mut representations = vec![Representation {
        width: source_width,
        height: source_height,
        video_kbps: top_video,
        audio_kbps: top_audio,
    }];

    representations.extend(
        STANDARD_LADDER
            .iter()
            .rev()
            .filter(|(height, _, _)| *height < source_height)
            .map(|&(height, video_kbps, audio_kbps)| Representation {
                width: even(f64::from(height) * aspect),
                height,
                video_kbps,
                audio_kbps,
            }),
    );

    representations
}
