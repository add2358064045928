//! Flattening nested input into entries.

use crate::{Error, Path, Source, Value};

use super::Tree;

impl Tree<'_> {
    /// Write `source` at `dest`, creating every container header with its
    /// final size.
    ///
    /// Loading at the root requires a container source and an empty root.
    /// Elsewhere the destination must not exist and its parent must accept
    /// it. Returns the number of entries written.
    pub fn load(&self, dest: &Path, source: &Source) -> Result<usize, Error> {
        log::debug!("load {} ({} entries)", dest, source.entry_count());
        if dest.is_wildcard() {
            return Err(Error::invalid_target(dest, "cannot load into a wildcard"));
        }

        if dest.is_root() {
            if !source.is_container() {
                return Err(Error::invalid_target(dest, "the root must be an object or an array"));
            }
            let root = self.fetch(dest)?;
            if root.exists() && root.size() > 0 {
                return Err(Error::invalid_target(dest, "the root is not empty"));
            }
            return self.flatten(dest, source, true);
        }

        self.ensure_root()?;
        let target = dest.base_path();
        let parent = self.check_bounds(&target)?;
        if self.fetch(&target)?.exists() {
            return Err(Error::invalid_target(dest, "already exists"));
        }
        let written = self.flatten(&target, source, false)?;
        if let Some(mut parent) = parent {
            let size = parent.size() + 1;
            self.rewrite_size(&mut parent, size)?;
        }
        Ok(written)
    }

    fn flatten(&self, path: &Path, source: &Source, overwrite: bool) -> Result<usize, Error> {
        match source {
            Source::Scalar(value) => {
                if value.is_container() {
                    return Err(Error::invalid_target(path, "containers are loaded as nested sources"));
                }
                self.put_new(path, value)?;
                Ok(1)
            }
            Source::Object(members) => {
                self.write_container(path, &Value::Object(members.len()), overwrite)?;
                let mut written = 1;
                for (name, member) in members {
                    written += self.flatten(&path.with_member(name)?, member, false)?;
                }
                Ok(written)
            }
            Source::Array(elements) => {
                self.write_container(path, &Value::Array(elements.len()), overwrite)?;
                let mut written = 1;
                for (i, element) in elements.iter().enumerate() {
                    written += self.flatten(&path.with_index(i)?, element, false)?;
                }
                Ok(written)
            }
        }
    }

    fn write_container(&self, path: &Path, header: &Value, overwrite: bool) -> Result<(), Error> {
        let dir = path.as_directory();
        if overwrite {
            self.put(&dir, header)
        } else {
            self.put_new(&dir, header)
        }
    }
}
