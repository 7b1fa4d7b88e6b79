use tokio::sync::watch;
use url::Url;

const PLACEHOLDER_ORIGIN: &str = "http://survey.local/";

/// Path and query of the page being shown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    path: String,
    query: Vec<(String, String)>,
}

impl Location {
    /// Accepts either a bare path (`/surveys/4?source=qr`) or a full URL.
    pub fn parse(raw: &str) -> Self {
        let parsed = Url::parse(raw).or_else(|_| {
            Url::parse(PLACEHOLDER_ORIGIN).and_then(|base| base.join(raw.trim()))
        });
        match parsed {
            Ok(url) => Self {
                path: url.path().to_string(),
                query: url
                    .query_pairs()
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect(),
            },
            Err(_) => Self {
                path: raw.to_string(),
                query: Vec::new(),
            },
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Survey identifier from `/surveys/{id}`; any other path has none.
    pub fn survey_id(&self) -> Option<u64> {
        let mut segments = self.path.trim_end_matches('/').split('/').skip(1);
        match (segments.next(), segments.next(), segments.next()) {
            (Some("surveys"), Some(id), None) => id.parse::<u64>().ok().filter(|id| *id > 0),
            _ => None,
        }
    }
}

/// Navigation port: the current location plus change notification.
#[derive(Debug, Clone)]
pub struct Navigator {
    sender: watch::Sender<Location>,
}

impl Navigator {
    pub fn new(initial: Location) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    pub fn current(&self) -> Location {
        self.sender.borrow().clone()
    }

    pub fn navigate(&self, raw: &str) {
        self.sender.send_replace(Location::parse(raw));
    }

    pub fn subscribe(&self) -> watch::Receiver<Location> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survey_id_requires_survey_path() {
        assert_eq!(Location::parse("/surveys/12").survey_id(), Some(12));
        assert_eq!(Location::parse("/surveys/12/").survey_id(), Some(12));
        assert_eq!(Location::parse("/surveys/12?source=qr").survey_id(), Some(12));
        assert_eq!(Location::parse("https://vote.example/surveys/5").survey_id(), Some(5));
        assert_eq!(Location::parse("/surveys/0").survey_id(), None);
        assert_eq!(Location::parse("/surveys/-3").survey_id(), None);
        assert_eq!(Location::parse("/surveys/abc").survey_id(), None);
        assert_eq!(Location::parse("/surveys").survey_id(), None);
        assert_eq!(Location::parse("/surveys/1/results").survey_id(), None);
        assert_eq!(Location::parse("/").survey_id(), None);
    }

    #[test]
    fn query_params_are_decoded() {
        let location = Location::parse("/surveys/1?city=S%C3%A3o+Paulo&country=BR");
        assert_eq!(location.query_param("city"), Some("São Paulo"));
        assert_eq!(location.query_param("country"), Some("BR"));
        assert_eq!(location.query_param("state"), None);
    }

    #[test]
    fn navigator_notifies_subscribers() {
        let navigator = Navigator::new(Location::parse("/surveys/1"));
        let mut receiver = navigator.subscribe();
        navigator.navigate("/surveys/2");
        assert!(receiver.has_changed().expect("open"));
        assert_eq!(receiver.borrow_and_update().survey_id(), Some(2));
        assert_eq!(navigator.current().survey_id(), Some(2));
    }
}
