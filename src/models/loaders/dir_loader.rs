use crate::error::{AppError, AppResult};
use crate::models::file::UploadFile;
use std::io;
use std::path::PathBuf;
use tokio::fs;

/// 从文件夹中收集所有普通文件作为待上传文件（按文件名排序）
pub async fn load_upload_files(folder_path: &str) -> AppResult<Vec<UploadFile>> {
    let folder = PathBuf::from(folder_path);

    if !folder.is_dir() {
        return Err(AppError::file(
            folder_path,
            io::Error::new(io::ErrorKind::NotFound, "文件夹不存在"),
        ));
    }

    let mut files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file(folder_path, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file(folder_path, e))?
    {
        let path = entry.path();
        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!("读取文件信息失败 {}: {}", path.display(), e);
                continue;
            }
        };

        if !metadata.is_file() {
            continue;
        }

        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        tracing::debug!("发现待上传文件: {} ({} 字节)", name, metadata.len());

        files.push(
            UploadFile::new(name)
                .with_path(path)
                .with_size(metadata.len()),
        );
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_folder_is_error() {
        let result = load_upload_files("definitely/not/a/real/folder").await;
        match result {
            Err(AppError::File { path, source }) => {
                assert_eq!(path, "definitely/not/a/real/folder");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("期望文件错误, 实际: {:?}", other.map(|files| files.len())),
        }
    }

    #[tokio::test]
    async fn test_loads_files_sorted_and_skips_dirs() {
        let dir = std::env::temp_dir().join(format!("batch_upload_loader_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir).await;
        fs::create_dir_all(dir.join("nested")).await.unwrap();
        fs::write(dir.join("b.txt"), b"bbbb").await.unwrap();
        fs::write(dir.join("a.txt"), b"aa").await.unwrap();

        let files = load_upload_files(dir.to_str().unwrap()).await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(files[0].size, Some(2));
        assert_eq!(files[1].size, Some(4));

        let _ = fs::remove_dir_all(&dir).await;
    }
}
