use crate::models::quiz::QuizDraft;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载试卷草稿
///
/// 文件格式：
/// ```toml
/// title = "地理小测"
/// duration_minutes = 10
///
/// [[question]]
/// text = "太阳从哪边升起？"
/// options = ["东", "南", "西", "北"]
/// correct = 0
/// ```
pub async fn load_quiz_draft(toml_file_path: &Path) -> Result<QuizDraft> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let draft: QuizDraft = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    Ok(draft.with_file_path(toml_file_path.to_string_lossy().to_string()))
}

/// 从文件夹中加载所有试卷草稿，按文件名排序
pub async fn load_all_quiz_drafts(folder_path: &str) -> Result<Vec<QuizDraft>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut drafts = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_quiz_draft(&path).await {
            Ok(draft) => {
                tracing::info!("成功加载 {} 道题目", draft.questions.len());
                drafts.push(draft);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
title = "地理小测"
duration_minutes = 10

[[question]]
text = "太阳从哪边升起？"
options = ["东", "南", "西", "北"]
correct = 0

[[question]]
text = "地球有几个大洲？"
options = ["5", "6", "7", "8"]
correct = 2
"#;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("quiz_loader_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_load_quiz_draft() {
        let dir = temp_dir("single");
        let path = dir.join("geo.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let draft = load_quiz_draft(&path).await.unwrap();
        assert_eq!(draft.title, "地理小测");
        assert_eq!(draft.questions.len(), 2);
        assert_eq!(draft.questions[1].correct, 2);
        assert!(draft.file_path.is_some());

        let request = draft.into_request().unwrap();
        assert_eq!(request.duration_seconds, Some(600));
    }

    #[tokio::test]
    async fn test_load_all_skips_broken_files() {
        let dir = temp_dir("folder");
        std::fs::write(dir.join("a.toml"), SAMPLE).unwrap();
        std::fs::write(dir.join("b.toml"), "title = ").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let drafts = load_all_quiz_drafts(dir.to_str().unwrap()).await.unwrap();
        assert_eq!(drafts.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_folder_is_error() {
        assert!(load_all_quiz_drafts("/definitely/not/here").await.is_err());
    }
}
