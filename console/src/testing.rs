//! Test doubles: a scripted byte transport and an in-memory filesystem

use std::collections::BTreeMap;
use std::string::String;
use std::vec::Vec;

use embedded_io::{ErrorType, Read, Write};

use crate::fs::{
    bounded, resolve, Attributes, FatType, FileInfo, FileSystem, FsError, FsResult, OpenMode,
    PathBuf, VolumeInfo, VolumeLabel,
};

/// Transport that replays fixed input and records all output
pub struct ScriptedIo {
    input: Vec<u8>,
    pos: usize,
    output: Vec<u8>,
    /// Output length at the last flush
    flushed: usize,
}

impl ScriptedIo {
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: input.to_vec(),
            pos: 0,
            output: Vec::new(),
            flushed: 0,
        }
    }

    /// Output bytes written but not flushed yet
    pub fn pending(&self) -> usize {
        self.output.len() - self.flushed
    }

    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    pub fn clear_output(&mut self) {
        self.output.clear();
        self.flushed = 0;
    }

    /// Input bytes not consumed yet
    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }
}

impl ErrorType for ScriptedIo {
    type Error = core::convert::Infallible;
}

impl Read for ScriptedIo {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() || self.pos >= self.input.len() {
            return Ok(0);
        }
        buf[0] = self.input[self.pos];
        self.pos += 1;
        Ok(1)
    }
}

impl Write for ScriptedIo {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushed = self.output.len();
        Ok(())
    }
}

enum Node {
    Dir,
    File(Vec<u8>),
}

pub struct MockDir {
    id: usize,
    path: String,
    pos: usize,
}

pub struct MockFile {
    id: usize,
    path: String,
    pos: usize,
    mode: OpenMode,
}

/// One `read_dir` call as seen by the filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadDirStep {
    /// Directory the handle belongs to
    pub dir: String,
    /// Current directory at the time of the call
    pub cwd: String,
    /// Directory handles open at the time of the call
    pub open_dirs: usize,
}

/// In-memory filesystem with handle accounting and fault injection
pub struct MockFs {
    nodes: BTreeMap<String, Node>,
    cwd: String,
    mounted: bool,
    next_id: usize,
    open_dir_ids: Vec<usize>,
    open_file_ids: Vec<usize>,

    pub dir_opens: usize,
    pub dir_closes: usize,
    pub file_opens: usize,
    pub file_closes: usize,
    pub trace: Vec<ReadDirStep>,

    pub fail_mount: Option<FsError>,
    pub fail_info: Option<FsError>,
    pub fail_label: Option<FsError>,
    /// Absolute paths whose `open_dir` fails with `Denied`
    pub fail_open: Vec<String>,
    /// Absolute paths whose `change_dir` fails with `NoPath`
    pub fail_chdir: Vec<String>,
    /// Absolute paths whose `read_dir` fails with `DiskErr`
    pub fail_read_dir: Vec<String>,
    pub fail_close_dir: bool,
    pub fail_close_file: bool,
    pub fail_read_file: bool,
    pub fail_write: Option<FsError>,
    /// Largest size any file may grow to
    pub write_limit: Option<usize>,
}

impl MockFs {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(String::from("/"), Node::Dir);
        Self {
            nodes,
            cwd: String::from("/"),
            mounted: false,
            next_id: 1,
            open_dir_ids: Vec::new(),
            open_file_ids: Vec::new(),
            dir_opens: 0,
            dir_closes: 0,
            file_opens: 0,
            file_closes: 0,
            trace: Vec::new(),
            fail_mount: None,
            fail_info: None,
            fail_label: None,
            fail_open: Vec::new(),
            fail_chdir: Vec::new(),
            fail_read_dir: Vec::new(),
            fail_close_dir: false,
            fail_close_file: false,
            fail_read_file: false,
            fail_write: None,
            write_limit: None,
        }
    }

    /// Already mounted, as after a successful `cm`
    pub fn mounted() -> Self {
        let mut fs = Self::new();
        fs.mounted = true;
        fs
    }

    pub fn with_dir(mut self, path: &str) -> Self {
        self.nodes.insert(String::from(path), Node::Dir);
        self
    }

    pub fn with_file(mut self, path: &str, size: usize) -> Self {
        let data = (0..size).map(|i| b'a' + (i % 26) as u8).collect();
        self.nodes.insert(String::from(path), Node::File(data));
        self
    }

    pub fn with_contents(mut self, path: &str, data: &[u8]) -> Self {
        self.nodes.insert(String::from(path), Node::File(data.to_vec()));
        self
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn set_cwd(&mut self, path: &str) {
        self.cwd = String::from(path);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn exists(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn contents(&self, path: &str) -> Option<&[u8]> {
        match self.nodes.get(path) {
            Some(Node::File(data)) => Some(data),
            _ => None,
        }
    }

    pub fn open_dirs(&self) -> usize {
        self.open_dir_ids.len()
    }

    pub fn open_files(&self) -> usize {
        self.open_file_ids.len()
    }

    fn ready(&self) -> FsResult<()> {
        if self.mounted {
            Ok(())
        } else {
            Err(FsError::NotEnabled)
        }
    }

    fn absolute(&self, path: &str) -> FsResult<String> {
        Ok(String::from(resolve(&self.cwd, path)?.as_str()))
    }

    fn children(&self, dir: &str) -> Vec<(String, bool, usize)> {
        self.nodes
            .iter()
            .filter(|(path, _)| path.as_str() != "/" && parent_of(path) == dir)
            .map(|(path, node)| {
                let name = String::from(&path[path.rfind('/').map_or(0, |i| i + 1)..]);
                match node {
                    Node::Dir => (name, true, 0),
                    Node::File(data) => (name, false, data.len()),
                }
            })
            .collect()
    }

    fn is_dir(&self, path: &str) -> bool {
        matches!(self.nodes.get(path), Some(Node::Dir))
    }

    fn take_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

impl FileSystem for MockFs {
    type Dir = MockDir;
    type File = MockFile;

    fn mount(&mut self, _root: &str) -> FsResult<()> {
        if let Some(err) = self.fail_mount {
            return Err(err);
        }
        self.mounted = true;
        self.cwd = String::from("/");
        Ok(())
    }

    fn volume_info(&mut self, _root: &str) -> FsResult<VolumeInfo> {
        self.ready()?;
        if let Some(err) = self.fail_info {
            return Err(err);
        }
        Ok(VolumeInfo {
            fat_type: FatType::Fat16,
            sectors_per_cluster: 4,
            fat_count: 2,
            root_entries: 512,
            sectors_per_fat: 32,
            cluster_count: 8000,
            free_clusters: 7990,
            volume_start: 0,
            fat_start: 4,
            dir_start: 68,
            data_start: 100,
        })
    }

    fn volume_label(&mut self, _root: &str) -> FsResult<VolumeLabel> {
        self.ready()?;
        if let Some(err) = self.fail_label {
            return Err(err);
        }
        Ok(VolumeLabel {
            label: bounded("SDCARD"),
            serial: 0x1234_abcd,
        })
    }

    fn open_dir(&mut self, path: &str) -> FsResult<MockDir> {
        self.ready()?;
        let path = self.absolute(path)?;
        if self.fail_open.contains(&path) {
            return Err(FsError::Denied);
        }
        if !self.is_dir(&path) {
            return Err(FsError::NoPath);
        }
        let id = self.take_id();
        self.open_dir_ids.push(id);
        self.dir_opens += 1;
        Ok(MockDir { id, path, pos: 0 })
    }

    fn read_dir(&mut self, dir: &mut MockDir) -> FsResult<Option<FileInfo>> {
        if !self.open_dir_ids.contains(&dir.id) {
            return Err(FsError::InvalidObject);
        }
        self.trace.push(ReadDirStep {
            dir: dir.path.clone(),
            cwd: self.cwd.clone(),
            open_dirs: self.open_dir_ids.len(),
        });
        if self.fail_read_dir.contains(&dir.path) {
            return Err(FsError::DiskErr);
        }
        let entry = self.children(&dir.path).into_iter().nth(dir.pos);
        Ok(entry.map(|(name, is_dir, size)| {
            dir.pos += 1;
            let attributes = if is_dir {
                Attributes::DIRECTORY
            } else {
                Attributes::ARCHIVE
            };
            FileInfo::new(&name, size as u32, attributes)
        }))
    }

    fn close_dir(&mut self, dir: MockDir) -> FsResult<()> {
        let Some(index) = self.open_dir_ids.iter().position(|&id| id == dir.id) else {
            return Err(FsError::InvalidObject);
        };
        self.open_dir_ids.remove(index);
        self.dir_closes += 1;
        if self.fail_close_dir {
            return Err(FsError::DiskErr);
        }
        Ok(())
    }

    fn change_dir(&mut self, path: &str) -> FsResult<()> {
        self.ready()?;
        let target = self.absolute(path)?;
        if self.fail_chdir.contains(&target) || !self.is_dir(&target) {
            return Err(FsError::NoPath);
        }
        self.cwd = target;
        Ok(())
    }

    fn current_dir(&mut self) -> FsResult<PathBuf> {
        self.ready()?;
        Ok(bounded(&self.cwd))
    }

    fn make_dir(&mut self, path: &str) -> FsResult<()> {
        self.ready()?;
        let path = self.absolute(path)?;
        if self.nodes.contains_key(&path) {
            return Err(FsError::Exist);
        }
        if !self.is_dir(parent_of(&path)) {
            return Err(FsError::NoPath);
        }
        self.nodes.insert(path, Node::Dir);
        Ok(())
    }

    fn unlink(&mut self, path: &str) -> FsResult<()> {
        self.ready()?;
        let path = self.absolute(path)?;
        if path == "/" || path == self.cwd {
            return Err(FsError::Denied);
        }
        match self.nodes.get(&path) {
            None => return Err(FsError::NoFile),
            Some(Node::Dir) if !self.children(&path).is_empty() => return Err(FsError::Denied),
            Some(_) => {}
        }
        self.nodes.remove(&path);
        Ok(())
    }

    fn open_file(&mut self, path: &str, mode: OpenMode) -> FsResult<MockFile> {
        self.ready()?;
        let path = self.absolute(path)?;
        match self.nodes.get_mut(&path) {
            Some(Node::Dir) => return Err(FsError::Denied),
            Some(Node::File(data)) => {
                if mode.contains(OpenMode::CREATE_NEW) {
                    return Err(FsError::Exist);
                }
                if mode.contains(OpenMode::CREATE_ALWAYS) {
                    data.clear();
                }
            }
            None => {
                let creates = OpenMode::CREATE_NEW | OpenMode::CREATE_ALWAYS | OpenMode::OPEN_ALWAYS;
                if !mode.intersects(creates) {
                    return Err(FsError::NoFile);
                }
                if !self.is_dir(parent_of(&path)) {
                    return Err(FsError::NoPath);
                }
                self.nodes.insert(path.clone(), Node::File(Vec::new()));
            }
        }
        let id = self.take_id();
        self.open_file_ids.push(id);
        self.file_opens += 1;
        Ok(MockFile { id, path, pos: 0, mode })
    }

    fn read_file(&mut self, file: &mut MockFile, buf: &mut [u8]) -> FsResult<usize> {
        if !self.open_file_ids.contains(&file.id) {
            return Err(FsError::InvalidObject);
        }
        if !file.mode.contains(OpenMode::READ) {
            return Err(FsError::Denied);
        }
        if self.fail_read_file {
            return Err(FsError::DiskErr);
        }
        let Some(Node::File(data)) = self.nodes.get(&file.path) else {
            return Err(FsError::NoFile);
        };
        let n = buf.len().min(data.len().saturating_sub(file.pos));
        buf[..n].copy_from_slice(&data[file.pos..file.pos + n]);
        file.pos += n;
        Ok(n)
    }

    fn write_file(&mut self, file: &mut MockFile, buf: &[u8]) -> FsResult<usize> {
        if !self.open_file_ids.contains(&file.id) {
            return Err(FsError::InvalidObject);
        }
        if !file.mode.contains(OpenMode::WRITE) {
            return Err(FsError::Denied);
        }
        if let Some(err) = self.fail_write {
            return Err(err);
        }
        let limit = self.write_limit.unwrap_or(usize::MAX);
        let Some(Node::File(data)) = self.nodes.get_mut(&file.path) else {
            return Err(FsError::NoFile);
        };
        let n = buf.len().min(limit.saturating_sub(file.pos));
        let end = file.pos + n;
        if data.len() < end {
            data.resize(end, 0);
        }
        data[file.pos..end].copy_from_slice(&buf[..n]);
        file.pos = end;
        Ok(n)
    }

    fn close_file(&mut self, file: MockFile) -> FsResult<()> {
        let Some(index) = self.open_file_ids.iter().position(|&id| id == file.id) else {
            return Err(FsError::InvalidObject);
        };
        self.open_file_ids.remove(index);
        self.file_closes += 1;
        if self.fail_close_file {
            return Err(FsError::DiskErr);
        }
        Ok(())
    }
}
