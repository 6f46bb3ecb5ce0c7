//! Resume point location and the rematch pass

use crate::error::ExtractorError;
use crate::extractor::Extractor;
use crate::identifier::{extract_identifier, with_identifier_prefix};
use crate::prompt::{PromptBuilder, PromptKind};
use crate::types::RematchResult;
use reqsift_domain::traits::LlmProvider;
use reqsift_domain::{Document, RecordSet, RequirementCandidate, RequirementRecord};
use tracing::{debug, error, info, warn};

/// Characters of the last matched content used as the anchor
pub const ANCHOR_CHARS: usize = 200;

/// Length of the anchor slices tried in fuzzy mode
pub const FUZZY_SLICE_CHARS: usize = 30;

/// Find where to resume after `last_content`, the body of the last record
/// already captured.
///
/// Paragraphs are scanned from the end; the index after the first one that
/// matches the anchor is returned, or 0 when nothing matches. In fuzzy mode a
/// paragraph matches when it contains any 30-character slice of the anchor,
/// which copes with content that was joined from several paragraphs.
///
/// # Examples
///
/// ```
/// use reqsift_extractor::rematch::locate_resume_point;
///
/// let paras = ["3.1.1 Alpha", "alpha body text", "3.1.2 Beta", "beta body text"];
/// assert_eq!(locate_resume_point(&paras, "", true), 0);
/// assert_eq!(locate_resume_point(&paras, "alpha body text", false), 2);
/// ```
pub fn locate_resume_point<S: AsRef<str>>(paragraphs: &[S], last_content: &str, fuzzy: bool) -> usize {
    let anchor: Vec<char> = last_content.chars().take(ANCHOR_CHARS).collect();
    if anchor.is_empty() || paragraphs.is_empty() {
        return 0;
    }
    let anchor_text: String = anchor.iter().collect();
    let slice_len = FUZZY_SLICE_CHARS.min(anchor.len());

    for (idx, para) in paragraphs.iter().enumerate().rev() {
        let para = para.as_ref();
        let matched = if fuzzy {
            anchor.windows(slice_len).any(|window| {
                let slice: String = window.iter().collect();
                para.contains(slice.as_str())
            })
        } else {
            para.contains(anchor_text.as_str())
        };
        if matched {
            return idx + 1;
        }
    }
    0
}

impl<L> Extractor<L>
where
    L: LlmProvider + Send + Sync + 'static,
{
    /// Look for requirements missed by an earlier run
    ///
    /// Resumes after the last of `matched`, sends the remaining text (cut to
    /// `rematch_window_units`) in one request, and appends candidates whose
    /// titles are not already known. `matched` is returned unchanged, first.
    pub async fn rematch(
        &self,
        document: &Document,
        matched: &[RequirementRecord],
    ) -> Result<RematchResult, ExtractorError> {
        self.config().validate()?;
        info!("Rematching with {} records already matched", matched.len());

        let paragraphs = document.paragraphs();
        let resume_index = matched
            .last()
            .map(|record| locate_resume_point(paragraphs, &record.content, true))
            .unwrap_or(0);
        let mut records: RecordSet = matched.iter().cloned().collect();

        let unchanged = |records: RecordSet| RematchResult {
            records: records.into_vec(),
            added: 0,
            resume_index,
        };

        if resume_index >= paragraphs.len() {
            info!("Last match is at the end of the document; nothing to rematch");
            return Ok(unchanged(records));
        }
        if self.is_cancelled() {
            warn!("Rematch cancelled");
            return Ok(unchanged(records));
        }
        info!("Resuming from paragraph {}", resume_index);

        let remaining = paragraphs[resume_index..].join("\n");
        let budget = self.config().rematch_window_units;
        let units = self.estimator().estimate(&remaining);
        let text = if units > budget {
            info!("Remaining text truncated from {} to {} units", units, budget);
            self.estimator().truncate(&remaining, budget)
        } else {
            remaining
        };

        let prompt = PromptBuilder::new(text, PromptKind::Rematch).build();
        let salvaged = match self.request(prompt).await {
            Ok(salvaged) => salvaged,
            Err(e) => {
                if e.is_fatal() {
                    error!("Rematch failed: {}", e);
                } else {
                    warn!("Rematch produced nothing: {}", e);
                }
                return Ok(unchanged(records));
            }
        };

        let mut added = 0;
        for candidate in salvaged.candidates() {
            if !candidate.has_content(self.config().min_content_chars) {
                continue;
            }
            let title = rematch_title(&candidate, added + 1);
            if records.contains(&title) {
                debug!("Skipping already matched: {}", title);
                continue;
            }

            let identifier = candidate
                .identifier
                .clone()
                .or_else(|| extract_identifier(&candidate.content));
            let content = match &identifier {
                Some(id) => with_identifier_prefix(&candidate.content, id),
                None => candidate.content.clone(),
            };

            info!("Rematched new requirement: {}", title);
            records.insert_new(RequirementRecord {
                title,
                chapter: candidate.chapter_number,
                identifier,
                content,
            });
            added += 1;
        }

        info!("Rematch complete: {} new requirements", added);
        Ok(RematchResult {
            records: records.into_vec(),
            added,
            resume_index,
        })
    }
}

/// Title for a rematched candidate, falling back to the chapter heading, the
/// identifier, then a numbered placeholder.
fn rematch_title(candidate: &RequirementCandidate, ordinal: usize) -> String {
    if !candidate.title.is_empty() {
        return candidate.title.clone();
    }
    if let Some((_, rest)) = candidate
        .chapter_number
        .as_deref()
        .and_then(|chapter| chapter.split_once(' '))
    {
        let rest = rest.trim();
        if !rest.is_empty() {
            return rest.to_string();
        }
    }
    match candidate
        .identifier
        .clone()
        .or_else(|| extract_identifier(&candidate.content))
    {
        Some(id) => format!("需求{}", id),
        None => format!("未命名需求{}", ordinal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs() -> Vec<String> {
        vec![
            "3.2.1 用户登录".to_string(),
            "a) 标识号: REQ-1.1".to_string(),
            "b) 说明: 用户输入账号和密码后点击登录按钮进入系统首页，并显示欢迎信息".to_string(),
            "3.2.2 数据导出".to_string(),
            "a) 标识号: REQ-1.2".to_string(),
        ]
    }

    #[test]
    fn test_empty_anchor_restarts() {
        assert_eq!(locate_resume_point(&paragraphs(), "", true), 0);
        assert_eq!(locate_resume_point::<String>(&[], "anything", true), 0);
    }

    #[test]
    fn test_last_paragraph_resumes_at_end() {
        let paras = paragraphs();
        let last = paras.last().unwrap().clone();
        assert_eq!(locate_resume_point(&paras, &last, false), paras.len());
        assert_eq!(locate_resume_point(&paras, &last, true), paras.len());
    }

    #[test]
    fn test_fuzzy_matches_joined_content() {
        let paras = paragraphs();
        let content = paras[..3].join("\n");
        // The joined anchor is not inside any single paragraph.
        assert_eq!(locate_resume_point(&paras, &content, false), 0);
        assert_eq!(locate_resume_point(&paras, &content, true), 3);
    }

    #[test]
    fn test_backward_scan_takes_last_occurrence() {
        let paras = vec!["repeated line", "other", "repeated line", "tail"];
        assert_eq!(locate_resume_point(&paras, "repeated line", false), 3);
    }

    #[test]
    fn test_no_match_restarts() {
        assert_eq!(locate_resume_point(&paragraphs(), "completely unrelated text", true), 0);
    }

    #[test]
    fn test_title_fallbacks() {
        let mut candidate = RequirementCandidate::new("", "body without id");
        candidate.chapter_number = Some("3.2.3 权限管理".into());
        assert_eq!(rematch_title(&candidate, 1), "权限管理");

        candidate.chapter_number = Some("3.2.3".into());
        candidate.identifier = Some("REQ-1.3".into());
        assert_eq!(rematch_title(&candidate, 1), "需求REQ-1.3");

        candidate.identifier = None;
        assert_eq!(rematch_title(&candidate, 2), "未命名需求2");
    }
}
