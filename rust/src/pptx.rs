use std::io::{Cursor, Read};

use anyhow::{anyhow, Context, Result};
use zip::ZipArchive;

use crate::gemini::ImagePart;

pub const PPTX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// 1回の解析に渡すスライド画像の上限。
pub const MAX_ANALYZED_IMAGES: usize = 5;

/// .pptx（zip）の ppt/media/ 配下から画像を取り出す。
/// 対応形式以外のメディアは読み飛ばし、先頭からMAX_ANALYZED_IMAGES枚まで返す。
pub fn extract_images(pptx_bytes: &[u8]) -> Result<Vec<ImagePart>> {
    let mut archive = ZipArchive::new(Cursor::new(pptx_bytes))
        .context("PPTXファイルを開けませんでした")?;

    let mut media_names: Vec<String> = (0..archive.len())
        .filter_map(|i| archive.by_index(i).ok().map(|f| f.name().to_string()))
        .filter(|name| name.starts_with("ppt/media/") && !name.ends_with('/'))
        .collect();
    media_names.sort();

    let mut images = Vec::new();
    for name in media_names {
        let Some(mime_type) = image_mime_type(&name) else {
            continue;
        };

        let mut file = archive
            .by_name(&name)
            .with_context(|| format!("PPTX内のメディアを読めませんでした: {name}"))?;
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)
            .with_context(|| format!("PPTX内のメディアを読めませんでした: {name}"))?;

        images.push(ImagePart {
            mime_type: mime_type.to_string(),
            data,
        });
        if images.len() == MAX_ANALYZED_IMAGES {
            break;
        }
    }

    if images.is_empty() {
        return Err(anyhow!("PPTXファイル内に画像が見つかりませんでした"));
    }
    Ok(images)
}

fn image_mime_type(name: &str) -> Option<&'static str> {
    let extension = name.rsplit('.').next()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_images, MAX_ANALYZED_IMAGES};
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_pptx(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = ZipWriter::new(&mut cursor);
            let options = SimpleFileOptions::default();
            for (name, data) in entries {
                writer.start_file(*name, options).expect("start file");
                writer.write_all(data).expect("write file");
            }
            writer.finish().expect("finish zip");
        }
        cursor.into_inner()
    }

    #[test]
    fn extracts_supported_media_only() {
        let pptx = build_pptx(&[
            ("ppt/slides/slide1.xml", b"<xml/>"),
            ("ppt/media/image1.png", b"png-bytes"),
            ("ppt/media/video1.mp4", b"mp4-bytes"),
            ("ppt/media/image2.JPG", b"jpg-bytes"),
        ]);

        let images = extract_images(&pptx).expect("extract");
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].mime_type, "image/png");
        assert_eq!(images[0].data, b"png-bytes");
        assert_eq!(images[1].mime_type, "image/jpeg");
    }

    #[test]
    fn caps_extracted_images() {
        let names: Vec<String> = (0..8)
            .map(|i| format!("ppt/media/image{i}.png"))
            .collect();
        let entries: Vec<(&str, &[u8])> = names
            .iter()
            .map(|name| (name.as_str(), b"x".as_slice()))
            .collect();
        let pptx = build_pptx(&entries);

        let images = extract_images(&pptx).expect("extract");
        assert_eq!(images.len(), MAX_ANALYZED_IMAGES);
    }

    #[test]
    fn fails_when_no_images_present() {
        let pptx = build_pptx(&[("ppt/slides/slide1.xml", b"<xml/>")]);
        let err = extract_images(&pptx).expect_err("no images");
        assert!(err.to_string().contains("画像が見つかりませんでした"));
    }
}
