use super::types::{
    normalize_engine_confidence, BoundingBox, OcrEngine, RecognizedPage, RecognizedWord,
};
#[cfg(feature = "ocr")]
use super::OcrError;

/// Tesseract-backed recognition engine.
/// Only available when compiled with the `ocr` feature flag.
#[cfg(feature = "ocr")]
pub struct TesseractEngine {
    tessdata_dir: std::path::PathBuf,
    lang: String,
}

#[cfg(feature = "ocr")]
impl TesseractEngine {
    /// Initialize with a tessdata directory.
    pub fn new(tessdata_dir: &std::path::Path) -> Result<Self, OcrError> {
        if !tessdata_dir.join("eng.traineddata").exists() {
            return Err(OcrError::TessdataNotFound(tessdata_dir.to_path_buf()));
        }
        Ok(Self {
            tessdata_dir: tessdata_dir.to_path_buf(),
            lang: "eng".to_string(),
        })
    }

    /// Set language(s) for recognition (e.g., "eng", "eng+fra")
    pub fn with_languages(mut self, langs: &str) -> Self {
        self.lang = langs.to_string();
        self
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractEngine {
    fn recognize(&self, image_bytes: &[u8]) -> Result<RecognizedPage, OcrError> {
        let tessdata_str = self
            .tessdata_dir
            .to_str()
            .ok_or_else(|| OcrError::EngineInit("Invalid tessdata path".into()))?;

        let tess = tesseract::Tesseract::new(Some(tessdata_str), Some(&self.lang))
            .map_err(|e| OcrError::EngineInit(format!("{e:?}")))?;

        let mut tess = tess
            .set_image_from_mem(image_bytes)
            .map_err(|e| OcrError::Recognition(format!("{e:?}")))?;

        let text = tess
            .get_text()
            .map_err(|e| OcrError::Recognition(format!("{e:?}")))?;

        let page_confidence = normalize_engine_confidence(tess.mean_text_conf() as f32);

        // Per-word confidence and bounding boxes via TSV output.
        let words = match tess.get_tsv_text(0) {
            Ok(tsv) => parse_tsv_words(&tsv),
            Err(_) => {
                // Fallback: split text with page-mean confidence, no boxes
                text.split_whitespace()
                    .map(|w| RecognizedWord {
                        text: w.to_string(),
                        confidence: page_confidence,
                        bbox: None,
                    })
                    .collect()
            }
        };

        Ok(RecognizedPage { text, words })
    }
}

/// Mock recognition engine for unit testing without Tesseract.
///
/// Splits the configured text into words, all at the configured confidence,
/// and assigns each a synthetic left-to-right bounding box so evidence
/// anchoring is exercisable in tests.
pub struct MockOcrEngine {
    pub text: String,
    pub confidence: f32,
}

impl MockOcrEngine {
    pub fn new(text: &str, confidence: f32) -> Self {
        Self {
            text: text.to_string(),
            confidence,
        }
    }
}

impl OcrEngine for MockOcrEngine {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<RecognizedPage, super::OcrError> {
        let words = self
            .text
            .split_whitespace()
            .enumerate()
            .map(|(i, w)| RecognizedWord {
                text: w.to_string(),
                confidence: self.confidence,
                bbox: Some(BoundingBox {
                    x: (i * 100) as f32,
                    y: 40.0,
                    width: 90.0,
                    height: 20.0,
                }),
            })
            .collect();

        Ok(RecognizedPage {
            text: self.text.clone(),
            words,
        })
    }
}

/// Parse Tesseract TSV output into per-word confidence and bounding boxes.
/// TSV columns: level page_num block_num par_num line_num word_num left top width height conf text
/// Level 5 = individual word entries. Confidence is 0-100, scaled to 0.0-1.0;
/// Tesseract reports -1 for words it cannot assign confidence to.
#[cfg_attr(not(feature = "ocr"), allow(dead_code))]
fn parse_tsv_words(tsv: &str) -> Vec<RecognizedWord> {
    let mut results = Vec::new();

    for line in tsv.lines().skip(1) {
        // Skip header row
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        // Level 5 = word
        let level: i32 = match fields[0].parse() {
            Ok(l) => l,
            Err(_) => continue,
        };
        if level != 5 {
            continue;
        }

        let conf: f32 = match fields[10].parse() {
            Ok(c) => c,
            Err(_) => continue,
        };

        let word = fields[11].trim();
        if word.is_empty() {
            continue;
        }

        let bbox = parse_tsv_bbox(fields[6], fields[7], fields[8], fields[9]);

        results.push(RecognizedWord {
            text: word.to_string(),
            confidence: normalize_engine_confidence(conf),
            bbox,
        });
    }

    results
}

/// Bounding box from the left/top/width/height TSV columns.
fn parse_tsv_bbox(left: &str, top: &str, width: &str, height: &str) -> Option<BoundingBox> {
    Some(BoundingBox {
        x: left.parse().ok()?,
        y: top.parse().ok()?,
        width: width.parse().ok()?,
        height: height.parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TSV_SAMPLE: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
        1\t1\t0\t0\t0\t0\t0\t0\t1000\t1200\t-1\t\n\
        5\t1\t1\t1\t1\t1\t12\t34\t80\t22\t91\tClaim\n\
        5\t1\t1\t1\t1\t2\t100\t34\t90\t22\t-1\tNumber:\n\
        5\t1\t1\t1\t1\t3\t200\t34\t110\t22\t87\tCLM-9001\n";

    #[test]
    fn tsv_parses_word_rows_only() {
        let words = parse_tsv_words(TSV_SAMPLE);
        assert_eq!(words.len(), 3);
        assert_eq!(words[0].text, "Claim");
        assert!((words[0].confidence - 0.91).abs() < f32::EPSILON);
    }

    #[test]
    fn tsv_sentinel_confidence_becomes_zero() {
        let words = parse_tsv_words(TSV_SAMPLE);
        assert_eq!(words[1].text, "Number:");
        assert_eq!(words[1].confidence, 0.0);
    }

    #[test]
    fn tsv_bounding_boxes_populated() {
        let words = parse_tsv_words(TSV_SAMPLE);
        let bbox = words[2].bbox.as_ref().unwrap();
        assert_eq!(bbox.x, 200.0);
        assert_eq!(bbox.y, 34.0);
        assert_eq!(bbox.width, 110.0);
        assert_eq!(bbox.height, 22.0);
    }

    #[test]
    fn mock_engine_splits_words_with_boxes() {
        let engine = MockOcrEngine::new("Total Amount: $1200.00", 0.9);
        let page = engine.recognize(b"png").unwrap();
        assert_eq!(page.words.len(), 3);
        assert!(page.words.iter().all(|w| w.bbox.is_some()));
        assert!(page.words.iter().all(|w| (w.confidence - 0.9).abs() < f32::EPSILON));
    }
}
