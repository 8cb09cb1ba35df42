// In-session photo sets

use chrono::{DateTime, Utc};

/// One photo taken during the session. `remote_url` is filled once the upload lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPhoto {
    pub id: u64,
    pub local_uri: String,
    pub captured_at: DateTime<Utc>,
    pub remote_url: Option<String>,
}

/// Ordered photo list with append and remove-by-index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoSet {
    photos: Vec<LocalPhoto>,
}

impl PhotoSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, photo: LocalPhoto) -> usize {
        self.photos.push(photo);
        self.photos.len() - 1
    }

    /// Remove the photo at `index`, keeping the others in their original order
    pub fn remove(&mut self, index: usize) -> Option<LocalPhoto> {
        (index < self.photos.len()).then(|| self.photos.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&LocalPhoto> {
        self.photos.get(index)
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocalPhoto> {
        self.photos.iter()
    }

    pub fn as_slice(&self) -> &[LocalPhoto] {
        &self.photos
    }

    /// Record the public URL for a photo that is still in the set
    pub fn mark_uploaded(&mut self, id: u64, url: &str) -> bool {
        match self.photos.iter_mut().find(|p| p.id == id) {
            Some(photo) => {
                photo.remote_url = Some(url.to_string());
                true
            }
            None => false,
        }
    }
}
