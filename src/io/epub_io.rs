/// EPUB 容器 IO 实现
///
/// 打开时将 ZIP 中的全部条目读入内存（从磁盘打开时先做内存映射），
/// 之后的读写都在内存条目上进行；保存时重新打包为 ZIP，`mimetype` 总是第一个且不压缩。
use std::io::{Cursor, Read, Write};
use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use log::{debug, warn};
use memmap2::Mmap;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::traits::{ArchiveReader, ArchiveWriter};
use crate::utils::FixerError;

/// EPUB 规定的第一个条目
pub const MIMETYPE_ENTRY: &str = "mimetype";
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

/// 条目缓冲区预分配上限；ZIP 头中声明的大小不可信
const MAX_PREALLOC: u64 = 1 << 24;

/// 内存中的容器条目
#[derive(Debug, Clone)]
struct ArchiveEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// 内存中的 EPUB 容器
#[derive(Debug, Clone, Default)]
pub struct EpubArchive {
    entries: Vec<ArchiveEntry>,
}

impl EpubArchive {
    /// 从文件打开（内存映射）
    ///
    /// # 参数
    /// * `path` - EPUB 文件路径
    ///
    /// # 返回
    /// 容器不是合法 ZIP 时返回 `InvalidArchive`
    pub fn open(path: &Path) -> Result<Self, FixerError> {
        let file = std::fs::File::open(path)?;
        // 使用内存映射文件，条目解压后即释放
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_bytes(&mmap[..])
    }

    /// 从内存中的 ZIP 数据构建
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FixerError> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| FixerError::InvalidArchive(e.to_string()))?;

        let mut entries = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let mut file = zip.by_index(index)?;
            let mut data = Vec::with_capacity(file.size().min(MAX_PREALLOC) as usize);
            file.read_to_end(&mut data)?;

            entries.push(ArchiveEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }

        debug!("读取 {} 个容器条目", entries.len());
        Ok(Self { entries })
    }

    /// 创建空容器（只含 `mimetype`）
    pub fn new() -> Self {
        let mut archive = Self::default();
        archive.insert_bytes(MIMETYPE_ENTRY, EPUB_MIMETYPE.as_bytes().to_vec(), CompressionMethod::Stored);
        archive
    }

    fn position(&self, path: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == path && !e.is_dir)
    }

    /// 写入原始字节，已有条目保留其位置与压缩方式
    pub fn insert_bytes(&mut self, path: &str, data: Vec<u8>, compression: CompressionMethod) {
        match self.position(path) {
            Some(index) => self.entries[index].data = data,
            None => self.entries.push(ArchiveEntry {
                name: path.to_string(),
                data,
                compression,
                is_dir: false,
            }),
        }
    }

    pub fn entry_bytes(&self, path: &str) -> Option<&[u8]> {
        self.position(path).map(|index| self.entries[index].data.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 打包为 ZIP 数据
    pub fn to_bytes(&self) -> Result<Vec<u8>, FixerError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        // mimetype 必须是第一个条目且不压缩
        let mimetype = self
            .entry_bytes(MIMETYPE_ENTRY)
            .unwrap_or(EPUB_MIMETYPE.as_bytes());
        zip.start_file(MIMETYPE_ENTRY, stored)?;
        zip.write_all(mimetype)?;

        for entry in self.entries.iter().filter(|e| e.name != MIMETYPE_ENTRY) {
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), stored)?;
                continue;
            }

            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default().compression_method(method);
            zip.start_file(entry.name.as_str(), options)?;
            zip.write_all(&entry.data)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    /// 保存到文件（自动创建父目录）
    pub fn write_to_file(&self, path: &Path) -> Result<(), FixerError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

/// 解码条目文本：优先按 BOM 判断编码，否则按 UTF-8；有非法字节时有损解码并给出警告
pub fn decode_entry(path: &str, data: &[u8]) -> String {
    let (encoding, bom_len): (&'static Encoding, usize) =
        Encoding::for_bom(data).unwrap_or((UTF_8, 0));
    let (text, had_errors) = encoding.decode_without_bom_handling(&data[bom_len..]);
    if had_errors {
        warn!("{}: 含有无法按 {} 解码的字节，已替换", path, encoding.name());
    }
    text.into_owned()
}

impl ArchiveReader for EpubArchive {
    fn read_entry(&self, path: &str) -> Result<Option<String>, FixerError> {
        Ok(self.entry_bytes(path).map(|data| decode_entry(path, data)))
    }

    fn contains_entry(&self, path: &str) -> bool {
        self.position(path).is_some()
    }

    fn entry_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.name.clone())
            .collect()
    }
}

impl ArchiveWriter for EpubArchive {
    fn write_entry(&mut self, path: &str, content: String) -> Result<(), FixerError> {
        self.insert_bytes(path, content.into_bytes(), CompressionMethod::Deflated);
        Ok(())
    }
}
