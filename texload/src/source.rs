use std::{
  fmt::Debug,
  fs::File,
  io::{Cursor, Read, Seek},
  ops::Deref,
  path::{Path, PathBuf},
  sync::Arc,
};

use md5::Digest;
use memmap2::MmapOptions;

/// Byte stream a decoder can probe and rewind.
pub trait Readable: Read + Seek {}

impl<T: Read + Seek> Readable for T {}

/// Whole input file, randomly accessible for header and payload parsing.
pub struct ImageSource {
  path: PathBuf,
  inner: ImageSourceImpl,
}

enum ImageSourceImpl {
  Memmap(memmap2::Mmap),
  Memory(Arc<Vec<u8>>),
}

impl ImageSource {
  pub fn new(path: &Path) -> std::io::Result<Self> {
    let file = File::open(path)?;
    let mmap = unsafe { MmapOptions::new().populate().map(&file)? };
    #[cfg(unix)]
    {
      mmap.advise(memmap2::Advice::WillNeed)?;
      mmap.advise(memmap2::Advice::Sequential)?;
    }
    Ok(Self {
      path: path.canonicalize().unwrap_or_else(|_| path.to_owned()),
      inner: ImageSourceImpl::Memmap(mmap),
    })
  }

  pub fn new_from_shared_vec(buf: Arc<Vec<u8>>) -> Self {
    Self {
      path: PathBuf::default(),
      inner: ImageSourceImpl::Memory(buf),
    }
  }

  pub fn new_from_slice(buf: &[u8]) -> Self {
    Self::new_from_shared_vec(Arc::new(Vec::from(buf)))
  }

  /// Drain a stream from its current position into memory.
  pub fn new_from_reader(reader: &mut dyn Readable) -> std::io::Result<Self> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(Self::new_from_shared_vec(Arc::new(buf)))
  }

  pub fn with_path(self, path: impl AsRef<Path>) -> Self {
    Self {
      path: path.as_ref().to_owned(),
      inner: self.inner,
    }
  }

  /// Calculate digest for file
  pub fn digest(&self) -> Digest {
    md5::compute(self.buf())
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn buf(&self) -> &[u8] {
    self.deref()
  }

  pub fn reader(&self) -> Cursor<&[u8]> {
    Cursor::new(self.buf())
  }
}

impl Deref for ImageSource {
  type Target = [u8];

  fn deref(&self) -> &Self::Target {
    match &self.inner {
      ImageSourceImpl::Memmap(mmap) => mmap.deref(),
      ImageSourceImpl::Memory(mem) => mem.deref(),
    }
  }
}

impl Debug for ImageSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ImageSource").field("path", &self.path).field("len", &self.len()).finish()
  }
}
