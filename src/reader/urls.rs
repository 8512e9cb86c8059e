use crate::catalog::ItemId;
use url::Url;

/// Builds the catalog URLs a session navigates to
#[derive(Debug, Clone)]
pub struct CatalogUrls {
    base: Url,
}

impl CatalogUrls {
    /// `base` is the catalog root, e.g. `https://www.netflix.com/`
    pub fn new(base: &str) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Genre list view, sorted alphabetically so that loading is stable
    pub fn genre(&self, genre_id: &str) -> Result<Url, url::ParseError> {
        let mut url = self.base.join("browse/genre/")?.join(genre_id)?;
        url.query_pairs_mut().append_pair("so", "su");
        Ok(url)
    }

    /// Genre landing page, in the catalog's default order
    pub fn genre_landing(&self, genre_id: &str) -> Result<Url, url::ParseError> {
        self.base.join("browse/genre/")?.join(genre_id)
    }

    /// Item detail page
    pub fn title(&self, id: ItemId) -> Result<Url, url::ParseError> {
        self.base.join(&format!("title/{}", id))
    }

    /// Search results for an item name
    ///
    /// `|` separates alternative names in the catalog and confuses its
    /// search, so it is replaced by a space.
    pub fn search(&self, name: &str) -> Result<Url, url::ParseError> {
        let mut url = self.base.join("search")?;
        url.query_pairs_mut()
            .append_pair("q", &name.replace('|', " "));
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genre_url() {
        let urls = CatalogUrls::new("https://www.example.com/").unwrap();
        assert_eq!(
            urls.genre("34399").unwrap().as_str(),
            "https://www.example.com/browse/genre/34399?so=su"
        );
    }

    #[test]
    fn test_genre_landing_url_has_no_ordering() {
        let urls = CatalogUrls::new("https://www.example.com/").unwrap();
        assert_eq!(
            urls.genre_landing("83").unwrap().as_str(),
            "https://www.example.com/browse/genre/83"
        );
    }

    #[test]
    fn test_title_url() {
        let urls = CatalogUrls::new("https://www.example.com").unwrap();
        assert_eq!(
            urls.title(80057281).unwrap().as_str(),
            "https://www.example.com/title/80057281"
        );
    }

    #[test]
    fn test_base_with_path_prefix() {
        let urls = CatalogUrls::new("https://www.example.com/gb").unwrap();
        assert_eq!(
            urls.title(1).unwrap().as_str(),
            "https://www.example.com/gb/title/1"
        );
    }

    #[test]
    fn test_search_url_encodes_name() {
        let urls = CatalogUrls::new("https://www.example.com/").unwrap();
        assert_eq!(
            urls.search("Love|Death & Robots").unwrap().as_str(),
            "https://www.example.com/search?q=Love+Death+%26+Robots"
        );
    }
}
