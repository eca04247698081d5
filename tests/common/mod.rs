#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::HashMap,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use dnavatar::{
    AvatarError, AvatarResult, BodyPart, ColorFill, DescriptorSource, ImageLoader,
    PartDescriptor, PreparedImage, PremulRgba8, Rgb8, Subject,
};
use futures::future::LocalBoxFuture;

pub const W: u32 = 6;
pub const H: u32 = 2;
pub const PLACEHOLDER_PX: PremulRgba8 = [90, 90, 90, 255];

/// Completes after being polled `remaining + 1` times, waking itself in between.
pub struct Latency {
    remaining: u32,
}

impl Latency {
    pub fn new(ticks: u32) -> Self {
        Self { remaining: ticks }
    }
}

impl Future for Latency {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.remaining == 0 {
            return Poll::Ready(());
        }
        self.remaining -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

#[derive(Default)]
pub struct FakeLoader {
    pub images: HashMap<String, PreparedImage>,
    pub delays: HashMap<String, u32>,
    pub loads: RefCell<Vec<String>>,
}

impl ImageLoader for FakeLoader {
    fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, AvatarResult<PreparedImage>> {
        Box::pin(async move {
            self.loads.borrow_mut().push(url.to_string());
            Latency::new(self.delays.get(url).copied().unwrap_or(0)).await;
            self.images
                .get(url)
                .cloned()
                .ok_or_else(|| AvatarError::asset(format!("404 {url}")))
        })
    }
}

#[derive(Default)]
pub struct FakeDescriptors {
    pub parts: HashMap<BodyPart, Result<PartDescriptor, String>>,
    pub delays: HashMap<BodyPart, u32>,
    pub requests: RefCell<Vec<(&'static str, String, BodyPart)>>,
    pub completed: RefCell<Vec<BodyPart>>,
}

impl DescriptorSource for FakeDescriptors {
    fn fetch_part<'a>(
        &'a self,
        subject: &'a Subject,
        part: BodyPart,
    ) -> LocalBoxFuture<'a, AvatarResult<PartDescriptor>> {
        Box::pin(async move {
            self.requests
                .borrow_mut()
                .push((subject.endpoint(), subject.id().to_string(), part));
            Latency::new(self.delays.get(&part).copied().unwrap_or(0)).await;
            self.completed.borrow_mut().push(part);
            match self.parts.get(&part) {
                Some(Ok(d)) => Ok(d.clone()),
                Some(Err(msg)) => Err(AvatarError::descriptor(msg.clone())),
                None => Err(AvatarError::descriptor(format!("no part {part}"))),
            }
        })
    }
}

pub fn border_px(index: usize) -> PremulRgba8 {
    [
        [255, 0, 0, 255],
        [0, 255, 0, 255],
        [0, 0, 255, 255],
        [255, 255, 0, 255],
        [0, 255, 255, 255],
        [255, 0, 255, 255],
    ][index]
}

pub fn fill_rgb(index: usize) -> Rgb8 {
    [
        Rgb8::new(10, 20, 30),
        Rgb8::new(40, 50, 60),
        Rgb8::new(70, 80, 90),
        Rgb8::new(100, 110, 120),
        Rgb8::new(130, 140, 150),
        Rgb8::new(160, 170, 180),
    ][index]
}

pub fn fill_px(index: usize) -> PremulRgba8 {
    let c = fill_rgb(index);
    [c.r, c.g, c.b, 255]
}

pub fn border_url(part: BodyPart) -> String {
    format!("/img/avatar/{part}/border0.png")
}

pub fn fill_url(part: BodyPart) -> String {
    format!("/img/avatar/{part}/color0.png")
}

/// `W`x`H` image, opaque `px` on `row` for every column `>= from_x`.
pub fn stripe(row: u32, from_x: u32, px: PremulRgba8) -> PreparedImage {
    let mut data = vec![0u8; (W * H * 4) as usize];
    for x in from_x..W {
        let idx = ((row * W + x) * 4) as usize;
        data[idx..idx + 4].copy_from_slice(&px);
    }
    PreparedImage::new(W, H, data)
}

/// Every part `i` draws its border on row 0 and its fill on row 1, covering
/// columns `>= i`. With correct stacking, column `i` shows part `i`.
pub fn fixture() -> (FakeDescriptors, FakeLoader) {
    let mut descriptors = FakeDescriptors::default();
    let mut loader = FakeLoader::default();

    for (i, part) in BodyPart::ALL.into_iter().enumerate() {
        loader
            .images
            .insert(border_url(part), stripe(0, i as u32, border_px(i)));
        loader
            .images
            .insert(fill_url(part), stripe(1, i as u32, [5, 5, 5, 255]));
        descriptors.parts.insert(
            part,
            Ok(PartDescriptor {
                border_image: border_url(part),
                color_fill: Some(ColorFill {
                    image: fill_url(part),
                    rgb: fill_rgb(i),
                }),
            }),
        );
    }

    let mut placeholder = vec![0u8; (W * H * 4) as usize];
    placeholder[..4].copy_from_slice(&PLACEHOLDER_PX);
    loader
        .images
        .insert(dnavatar::PRIVATE_AVATAR.to_string(), PreparedImage::new(W, H, placeholder));

    (descriptors, loader)
}

pub fn settings() -> dnavatar::CompositorSettings {
    dnavatar::CompositorSettings {
        canvas: dnavatar::Canvas::new(W, H).unwrap(),
        ..Default::default()
    }
}

pub fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "dnavatar_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}
