use std::time::Duration;

use anyhow::{Context, Result};
use pg_core::error::CoreError;
use pg_core::frame::Image;
use pg_core::traits::Source;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::image::{decode, unavailable};

/// Photo aléatoire 800×600 (source par défaut hors pipe).
pub const RANDOM_PHOTO_URL: &str = "https://picsum.photos/800/600";
/// Chat aléatoire (redirige vers un JPEG).
pub const RANDOM_CAT_URL: &str = "http://thecatapi.com/api/images/get?format=src&type=jpg";
/// Chien aléatoire : l'API renvoie un JSON `{ "message": <url de l'image> }`.
pub const RANDOM_DOG_API_URL: &str = "https://dog.ceo/api/breeds/image/random";

const TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Fetch {
    /// The URL serves the encoded image.
    Image,
    /// The URL serves a dog.ceo JSON document pointing at the image.
    DogApi,
}

#[derive(Deserialize)]
struct DogApiResponse {
    message: String,
}

/// Image téléchargée par HTTP(S), décodée en mémoire.
///
/// Nothing is fetched before [`Source::acquire`]. Network errors, non-2xx
/// statuses and undecodable payloads all become
/// [`CoreError::SourceUnavailable`].
///
/// # Example
/// ```no_run
/// use pg_source::url::UrlSource;
/// use pg_core::traits::Source;
/// let mut source = UrlSource::new("https://picsum.photos/200/100");
/// let image = source.acquire().unwrap();
/// ```
pub struct UrlSource {
    url: String,
    fetch: Fetch,
}

impl UrlSource {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            fetch: Fetch::Image,
        }
    }

    #[must_use]
    pub fn random_photo() -> Self {
        Self::new(RANDOM_PHOTO_URL)
    }

    #[must_use]
    pub fn random_cat() -> Self {
        Self::new(RANDOM_CAT_URL)
    }

    #[must_use]
    pub fn random_dog() -> Self {
        Self::dog_api(RANDOM_DOG_API_URL)
    }

    /// Source resolving the image URL through a dog.ceo-style JSON endpoint.
    #[must_use]
    pub fn dog_api(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            fetch: Fetch::DogApi,
        }
    }

    fn download(&self) -> Result<Image> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .context("Client HTTP indisponible")?;

        let image_url = match self.fetch {
            Fetch::Image => self.url.clone(),
            Fetch::DogApi => {
                let body = fetch_bytes(&client, &self.url)?;
                let reply: DogApiResponse = serde_json::from_slice(&body)
                    .with_context(|| format!("Réponse JSON illisible de {}", self.url))?;
                log::debug!("{} → {}", self.url, reply.message);
                reply.message
            }
        };

        let bytes = fetch_bytes(&client, &image_url)?;
        let image = decode(&bytes).with_context(|| format!("Contenu de {image_url}"))?;
        log::info!(
            "Image téléchargée : {image_url} ({} octets, {}×{})",
            bytes.len(),
            image.width,
            image.height
        );
        Ok(image)
    }
}

impl Source for UrlSource {
    fn acquire(&mut self) -> Result<Image, CoreError> {
        self.download().map_err(unavailable)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("Requête vers {url} impossible"))?
        .error_for_status()
        .with_context(|| format!("Réponse en erreur de {url}"))?;
    let bytes = response
        .bytes()
        .with_context(|| format!("Lecture de la réponse de {url} impossible"))?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::{Cursor, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        RgbaImage::from_pixel(width, height, Rgba([40, 80, 120, 255]))
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn local_server() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        (listener, base)
    }

    /// Répond aux connexions successives avec `replies`, une par requête.
    fn serve(listener: TcpListener, replies: Vec<(&'static str, Vec<u8>)>) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            for (status, body) in replies {
                let (mut stream, _) = listener.accept().unwrap();
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = stream.read(&mut buf).unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                }
                let head = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                stream.write_all(head.as_bytes()).unwrap();
                stream.write_all(&body).unwrap();
            }
        })
    }

    #[test]
    fn downloads_and_decodes_png() {
        let (listener, base) = local_server();
        let server = serve(listener, vec![("200 OK", png_bytes(5, 3))]);
        let url = format!("{base}/cat.png");
        let mut source = UrlSource::new(url.clone());
        let image = source.acquire().unwrap();
        server.join().unwrap();
        assert_eq!((image.width, image.height), (5, 3));
        assert_eq!(image.pixel(4, 2), (40, 80, 120, 255));
        assert_eq!(source.describe(), url);
    }

    #[test]
    fn dog_api_reply_is_followed_to_the_image() {
        let (listener, base) = local_server();
        let json = format!("{{\"message\":\"{base}/dog.png\",\"status\":\"success\"}}");
        let server = serve(
            listener,
            vec![("200 OK", json.into_bytes()), ("200 OK", png_bytes(2, 2))],
        );
        let image = UrlSource::dog_api(format!("{base}/api")).acquire().unwrap();
        server.join().unwrap();
        assert_eq!((image.width, image.height), (2, 2));
    }

    #[test]
    fn http_error_status_is_source_unavailable() {
        let (listener, base) = local_server();
        let server = serve(listener, vec![("404 Not Found", b"absent".to_vec())]);
        let err = UrlSource::new(format!("{base}/absent.png")).acquire().unwrap_err();
        server.join().unwrap();
        match err {
            CoreError::SourceUnavailable(msg) => assert!(msg.contains("404"), "{msg}"),
            other => panic!("erreur inattendue : {other:?}"),
        }
    }

    #[test]
    fn non_image_payload_is_rejected() {
        let (listener, base) = local_server();
        let server = serve(listener, vec![("200 OK", b"<html>pas une image</html>".to_vec())]);
        let result = UrlSource::new(format!("{base}/page")).acquire();
        server.join().unwrap();
        assert!(matches!(result, Err(CoreError::SourceUnavailable(_))));
    }

    #[test]
    fn unreachable_host_is_source_unavailable() {
        let (listener, base) = local_server();
        drop(listener);
        let result = UrlSource::new(format!("{base}/x.png")).acquire();
        assert!(matches!(result, Err(CoreError::SourceUnavailable(_))));
    }

    #[test]
    fn random_sources_point_at_public_endpoints() {
        assert_eq!(UrlSource::random_photo().describe(), RANDOM_PHOTO_URL);
        assert_eq!(UrlSource::random_cat().describe(), RANDOM_CAT_URL);
        let dog = UrlSource::random_dog();
        assert_eq!(dog.fetch, Fetch::DogApi);
        assert_eq!(dog.describe(), RANDOM_DOG_API_URL);
    }
}
