//! Tar payload builders shared by unit tests.

use tar::{Builder, EntryType, Header};

pub(crate) struct TarFixture {
    builder: Builder<Vec<u8>>,
}

impl TarFixture {
    pub(crate) fn new() -> Self {
        Self {
            builder: Builder::new(Vec::new()),
        }
    }

    pub(crate) fn file(mut self, name: &str, content: &[u8], mode: u32, mtime: u64) -> Self {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(content.len() as u64);
        header.set_mode(mode);
        header.set_mtime(mtime);
        self.builder
            .append_data(&mut header, name, content)
            .expect("append file");
        self
    }

    pub(crate) fn dir(mut self, name: &str) -> Self {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        self.builder
            .append_data(&mut header, name, std::io::empty())
            .expect("append dir");
        self
    }

    pub(crate) fn symlink(mut self, name: &str, target: &str) -> Self {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Symlink);
        header.set_size(0);
        header.set_mode(0o777);
        self.builder
            .append_link(&mut header, name, target)
            .expect("append symlink");
        self
    }

    /// Regular file whose name bytes bypass the builder's path validation.
    pub(crate) fn raw_name_file(mut self, name: &[u8], content: &[u8], mode: u32) -> Self {
        let mut header = Header::new_old();
        header.as_mut_bytes()[..name.len()].copy_from_slice(name);
        header.set_entry_type(EntryType::Regular);
        header.set_size(content.len() as u64);
        header.set_mode(mode);
        header.set_mtime(1);
        header.set_cksum();
        self.builder.append(&header, content).expect("append raw");
        self
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.builder.into_inner().expect("finish tar")
    }
}
