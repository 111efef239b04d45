use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;
use crate::amf::AmfObject;

/// One unit of media handed to a publishing client
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSample {
    /// FLV audio tag body
    Audio { payload: Vec<u8>, pts: Duration },
    /// FLV video tag body
    Video { payload: Vec<u8>, pts: Duration },
    /// Stream metadata, sent as `@setDataFrame`
    Metadata(AmfObject),
}

impl MediaSample {
    pub fn pts(&self) -> Option<Duration> {
        match self {
            MediaSample::Audio { pts, .. } | MediaSample::Video { pts, .. } => Some(*pts),
            MediaSample::Metadata(_) => None,
        }
    }
}

/// Producer of samples for [`RtmpClient::publish_from`](super::RtmpClient::publish_from).
///
/// `Ok(None)` ends the stream.
#[async_trait]
pub trait MediaSource: Send {
    async fn next_sample(&mut self) -> Result<Option<MediaSample>>;
}

#[async_trait]
impl MediaSource for VecDeque<MediaSample> {
    async fn next_sample(&mut self) -> Result<Option<MediaSample>> {
        Ok(self.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_source() {
        let mut source: VecDeque<MediaSample> = VecDeque::from(vec![
            MediaSample::Metadata(AmfObject::new().with("width", 640.0)),
            MediaSample::Video {
                payload: vec![0x17, 0x00],
                pts: Duration::from_millis(40),
            },
        ]);

        assert_eq!(source.next_sample().await.unwrap().unwrap().pts(), None);
        assert_eq!(
            source.next_sample().await.unwrap().unwrap().pts(),
            Some(Duration::from_millis(40))
        );
        assert!(source.next_sample().await.unwrap().is_none());
    }
}
