//! Utilities for reading and writing data structures from and to disk.
//!
//! Flat `Copy` collections are dumped as their raw bytes via the `Store` and
//! `Load` traits. Composite structures implement `Deconstruct` and
//! `Reconstruct` and spread themselves over several files in a directory,
//! one per member array.

use std::{
    ffi::OsStr,
    fs::{metadata, File},
    io::{prelude::*, Result},
    mem,
    path::Path,
    slice,
};

/// Access to the serialized bytes of an object.
/// Do not use this trait directly but rather `Store`.
pub trait DataBytes {
    fn data_bytes(&self) -> &[u8];
}

/// Mutable access to the bytes of a preallocated object so serialized data
/// can be read back into it. Do not use directly but rather `Load`.
pub trait DataBytesMut {
    fn data_bytes_mut(&mut self) -> &mut [u8];
}

impl<T: Copy> DataBytes for [T] {
    fn data_bytes(&self) -> &[u8] {
        let num_bytes = self.len() * mem::size_of::<T>();
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

/// Writing objects to a file.
pub trait Store: DataBytes {
    fn write_to(&self, path: &dyn AsRef<Path>) -> Result<()> {
        File::create(path)?.write_all(self.data_bytes())
    }
}

impl<T: DataBytes + ?Sized> Store for T {}

/// Loading serialized data back into objects.
pub trait Load: DataBytesMut + Sized {
    /// Create an object of the right size for `num_bytes` of serialized data.
    fn new_with_bytes(num_bytes: usize) -> Self;

    fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let metadata = metadata(path.as_ref())?;
        let mut file = File::open(path)?;

        let mut object = Self::new_with_bytes(metadata.len() as usize);
        assert_eq!(metadata.len() as usize, object.data_bytes_mut().len());
        file.read_exact(object.data_bytes_mut())?;

        Ok(object)
    }
}

impl<T: Default + Copy> Load for Vec<T> {
    fn new_with_bytes(num_bytes: usize) -> Self {
        assert_eq!(num_bytes % mem::size_of::<T>(), 0);
        let num_elements = num_bytes / mem::size_of::<T>();
        (0..num_elements).map(|_| T::default()).collect()
    }
}

/// Serializing objects which need more than a single file.
pub trait Deconstruct: Sized {
    /// Should invoke `store` once for each member file, passing a name to
    /// identify the file and the data to write.
    fn store_each(&self, store: &dyn Fn(&str, &dyn Store) -> Result<()>) -> Result<()>;

    /// Store this object spread over files in the given directory.
    fn deconstruct_to<D: AsRef<OsStr>>(&self, dir: &D) -> Result<()> {
        let path = Path::new(dir);
        self.store_each(&|name, object: &dyn Store| object.write_to(&path.join(name)))
    }
}

/// Callback helper handed to `Reconstruct` impls for loading member files.
#[derive(Debug)]
pub struct Loader<'a> {
    path: &'a Path,
}

impl<'a> Loader<'a> {
    /// Load one member file back; `name` must match the one used with the
    /// `store_each` callback.
    pub fn load<T: Load, P: AsRef<Path>>(&self, name: P) -> Result<T> {
        T::load_from(self.path.join(name))
    }
}

/// Deserializing objects which need more than a single file.
pub trait Reconstruct: Sized {
    fn reconstruct_with(loader: Loader) -> Result<Self>;

    /// Rebuild the object from files in the given directory.
    fn reconstruct_from<D: AsRef<OsStr>>(dir: &D) -> Result<Self> {
        let path = Path::new(dir);
        Self::reconstruct_with(Loader { path })
    }
}
