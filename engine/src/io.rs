//! Reading and writing graph data as raw binary vectors, one file per attribute.
//!
//! # Example
//!
//! ```no_run
//! # use ch_matrix::io::*;
//! let head = Vec::<u32>::load_from("head")?;
//! head.write_to(&"head_copy")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{
    ffi::OsStr,
    fs::{metadata, File},
    io::{prelude::*, Error, ErrorKind, Result},
    mem,
    path::Path,
    slice,
};

/// Access the data of an object as a slice of bytes.
/// Only implemented for plain `Copy` data without padding (numbers).
pub trait DataBytes {
    fn data_bytes(&self) -> &[u8];
}

/// Mutable access to the bytes of an object so that serialized data can be read into it.
pub trait DataBytesMut {
    fn data_bytes_mut(&mut self) -> &mut [u8];
}

impl<T: Copy> DataBytes for [T] {
    fn data_bytes(&self) -> &[u8] {
        let num_bytes = std::mem::size_of_val(self);
        unsafe { slice::from_raw_parts(self.as_ptr() as *const u8, num_bytes) }
    }
}

impl<T: Copy> DataBytes for Vec<T> {
    fn data_bytes(&self) -> &[u8] {
        self[..].data_bytes()
    }
}

impl<T: Copy> DataBytesMut for Vec<T> {
    fn data_bytes_mut(&mut self) -> &mut [u8] {
        let num_bytes = self.len() * mem::size_of::<T>();
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr() as *mut u8, num_bytes) }
    }
}

/// Write serialized objects to disk.
pub trait Store: DataBytes {
    fn write_to(&self, path: &dyn AsRef<Path>) -> Result<()> {
        File::create(path)?.write_all(self.data_bytes())
    }
}

impl<T: DataBytes + ?Sized> Store for T {}

/// Load serialized data back into objects.
pub trait Load: DataBytesMut + Sized {
    /// Create an object of the correct size for serialized data with the given number of bytes.
    fn new_with_bytes(num_bytes: usize) -> Result<Self>;

    fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let metadata = metadata(path.as_ref())?;
        let mut file = File::open(path)?;

        let mut object = Self::new_with_bytes(metadata.len() as usize)?;
        file.read_exact(object.data_bytes_mut())?;

        Ok(object)
    }
}

impl<T: Default + Copy> Load for Vec<T> {
    fn new_with_bytes(num_bytes: usize) -> Result<Self> {
        if num_bytes % mem::size_of::<T>() != 0 {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("{} bytes is not a multiple of the element size {}", num_bytes, mem::size_of::<T>()),
            ));
        }
        Ok(vec![T::default(); num_bytes / mem::size_of::<T>()])
    }
}

/// Serialize objects which need more than a single file.
pub trait Deconstruct: Sized {
    /// Should call `store_callback` with a file name and the data for each file to be written.
    fn store_each(&self, store_callback: &dyn Fn(&str, &dyn Store) -> Result<()>) -> Result<()>;

    fn deconstruct_to<D: AsRef<OsStr> + ?Sized>(&self, dir: &D) -> Result<()> {
        let path = Path::new(dir);
        self.store_each(&|name, object: &dyn Store| object.write_to(&path.join(name)))
    }
}

/// Helper for loading multiple files of an object from a directory.
#[derive(Debug)]
pub struct Loader<'a> {
    path: &'a Path,
}

impl<'a> Loader<'a> {
    pub fn load<T: Load, P: AsRef<Path>>(&self, path: P) -> Result<T> {
        T::load_from(self.path.join(path))
    }

    pub fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        self.path.join(path).exists()
    }
}

/// Deserialize objects which need more than a single file.
pub trait Reconstruct: Sized {
    fn reconstruct_with(loader: Loader) -> Result<Self>;

    fn reconstruct_from<D: AsRef<OsStr> + ?Sized>(dir: &D) -> Result<Self> {
        let path = Path::new(dir);
        Self::reconstruct_with(Loader { path })
    }
}
