//! IO as data: side-effecting programs represented as inert trees.
//!
//! An [`Io<R>`] value *describes* a program producing an `R`; it performs
//! nothing by itself. Each request variant carries its payload plus a
//! one-shot continuation holding the rest of the program. An external
//! interpreter walks the tree top to bottom: it performs the real-world
//! action a request implies, then feeds the outcome to the continuation
//! to obtain the next node. The [`Handler`] trait plus [`Io::run`] form
//! that seam; construction is fully separated from execution.
//!
//! There is no failure variant. The tree cannot express "the write
//! failed" or "the file was not found"; an interpreter must surface such
//! failures through its own channel, e.g. by aborting the whole program.

use std::fmt;

/// A one-shot continuation: consumes the outcome of a request and yields
/// the rest of the program. Captured state moves into the box.
pub type Cont<T, R> = Box<dyn FnOnce(T) -> Io<R>>;

/// A suspended side-effecting program with final result type `R`.
///
/// The numeric tag of each variant (see [`Tag`]) is a fixed wire
/// identifier shared with external interpreters; it is part of the
/// contract and never renumbered.
pub enum Io<R> {
    /// The program has terminated with a value.
    Done(R),
    /// Emit text to the interpreter's output.
    PutText { text: String, cont: Cont<(), R> },
    /// Request a line of text from the interpreter.
    GetText { cont: Cont<String, R> },
    /// Write `data` to the named file.
    WriteFile {
        path: String,
        data: Vec<u8>,
        cont: Cont<(), R>,
    },
    /// Read the named file's contents.
    ReadFile { path: String, cont: Cont<Vec<u8>, R> },
    /// Request the current time.
    GetTime { cont: Cont<Timestamp, R> },
    /// Suspend for the given span.
    Sleep { duration: Span, cont: Cont<(), R> },
    /// Hand an image description to the interpreter for display.
    DrawImage { image: ImageTree, cont: Cont<(), R> },
}

/// Wire identifiers for [`Io`] variants. Fixed contract with external
/// interpreters; values are never reused or renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    Done = 0,
    PutText = 1,
    GetText = 2,
    WriteFile = 3,
    ReadFile = 4,
    GetTime = 5,
    Sleep = 6,
    DrawImage = 7,
}

impl Tag {
    pub fn from_u8(tag: u8) -> Option<Tag> {
        match tag {
            0 => Some(Tag::Done),
            1 => Some(Tag::PutText),
            2 => Some(Tag::GetText),
            3 => Some(Tag::WriteFile),
            4 => Some(Tag::ReadFile),
            5 => Some(Tag::GetTime),
            6 => Some(Tag::Sleep),
            7 => Some(Tag::DrawImage),
            _ => None,
        }
    }
}

/// A point in time as two opaque `u32` words.
///
/// The exact clock semantics belong to the host interpreter; this type
/// only fixes the split representation. [`Timestamp::from_u64`] and
/// [`Timestamp::to_u64`] pack the words as the high and low halves of a
/// 64-bit value for hosts that use a split 64-bit clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timestamp {
    pub hi: u32,
    pub lo: u32,
}

impl Timestamp {
    #[inline]
    pub fn from_u64(t: u64) -> Self {
        Self {
            hi: (t >> 32) as u32,
            lo: t as u32,
        }
    }

    #[inline]
    pub fn to_u64(self) -> u64 {
        (self.hi as u64) << 32 | self.lo as u64
    }
}

/// A duration as two opaque `u32` words, mirroring [`Timestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub hi: u32,
    pub lo: u32,
}

impl Span {
    #[inline]
    pub fn from_u64(d: u64) -> Self {
        Self {
            hi: (d >> 32) as u32,
            lo: d as u32,
        }
    }

    #[inline]
    pub fn to_u64(self) -> u64 {
        (self.hi as u64) << 32 | self.lo as u64
    }
}

/// An image description: a binary tree whose leaves are packed pixels.
///
/// `coord` packs x into the high 16 bits and y into the low 16 bits;
/// `color` is interpreter-defined (typically 0xRRGGBB).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageTree {
    Leaf,
    Node(Box<ImageTree>, Box<ImageTree>),
    Pixel { coord: u32, color: u32 },
}

impl ImageTree {
    pub fn pixel(x: u16, y: u16, color: u32) -> Self {
        ImageTree::Pixel {
            coord: (x as u32) << 16 | y as u32,
            color,
        }
    }

    pub fn node(left: ImageTree, right: ImageTree) -> Self {
        ImageTree::Node(Box::new(left), Box::new(right))
    }

    /// Visits every pixel leaf in left-to-right order as `(x, y, color)`.
    pub fn for_each_pixel<F: FnMut(u16, u16, u32)>(&self, f: &mut F) {
        match self {
            ImageTree::Leaf => {}
            ImageTree::Node(left, right) => {
                left.for_each_pixel(f);
                right.for_each_pixel(f);
            }
            ImageTree::Pixel { coord, color } => {
                f((coord >> 16) as u16, *coord as u16, *color);
            }
        }
    }
}

impl<R: 'static> Io<R> {
    /// The wire tag of the current node.
    pub fn tag(&self) -> Tag {
        match self {
            Io::Done(_) => Tag::Done,
            Io::PutText { .. } => Tag::PutText,
            Io::GetText { .. } => Tag::GetText,
            Io::WriteFile { .. } => Tag::WriteFile,
            Io::ReadFile { .. } => Tag::ReadFile,
            Io::GetTime { .. } => Tag::GetTime,
            Io::Sleep { .. } => Tag::Sleep,
            Io::DrawImage { .. } => Tag::DrawImage,
        }
    }

    /// Sequential composition: run `self` to completion, then run the
    /// program `f` builds from its result.
    ///
    /// `bind(Done(v), f)` is `f(v)`; for a request node the payload and
    /// tag are unchanged and only the continuation is rewritten to feed
    /// `f` after the original continuation. Satisfies left identity and
    /// associativity.
    pub fn bind<S, F>(self, f: F) -> Io<S>
    where
        S: 'static,
        F: FnOnce(R) -> Io<S> + 'static,
    {
        match self {
            Io::Done(v) => f(v),
            Io::PutText { text, cont } => Io::PutText {
                text,
                cont: Box::new(move |x| cont(x).bind(f)),
            },
            Io::GetText { cont } => Io::GetText {
                cont: Box::new(move |x| cont(x).bind(f)),
            },
            Io::WriteFile { path, data, cont } => Io::WriteFile {
                path,
                data,
                cont: Box::new(move |x| cont(x).bind(f)),
            },
            Io::ReadFile { path, cont } => Io::ReadFile {
                path,
                cont: Box::new(move |x| cont(x).bind(f)),
            },
            Io::GetTime { cont } => Io::GetTime {
                cont: Box::new(move |x| cont(x).bind(f)),
            },
            Io::Sleep { duration, cont } => Io::Sleep {
                duration,
                cont: Box::new(move |x| cont(x).bind(f)),
            },
            Io::DrawImage { image, cont } => Io::DrawImage {
                image,
                cont: Box::new(move |x| cont(x).bind(f)),
            },
        }
    }

    /// Transforms the final result without adding requests.
    pub fn map<S, F>(self, f: F) -> Io<S>
    where
        S: 'static,
        F: FnOnce(R) -> S + 'static,
    {
        self.bind(move |v| Io::Done(f(v)))
    }

    /// Runs `self`, discards its result, then runs `next`.
    pub fn then<S: 'static>(self, next: Io<S>) -> Io<S> {
        self.bind(move |_| next)
    }

    /// Drives the program to completion against `handler`, one request
    /// at a time in program order, and returns the final value.
    ///
    /// This is the cooperative single-threaded walker: each request
    /// blocks in the corresponding handler method until its outcome is
    /// available, then the continuation produces the next node.
    pub fn run<H: Handler>(mut self, handler: &mut H) -> R {
        loop {
            self = match self {
                Io::Done(v) => return v,
                Io::PutText { text, cont } => {
                    handler.put_text(&text);
                    cont(())
                }
                Io::GetText { cont } => {
                    let line = handler.get_text();
                    cont(line)
                }
                Io::WriteFile { path, data, cont } => {
                    handler.write_file(&path, &data);
                    cont(())
                }
                Io::ReadFile { path, cont } => {
                    let data = handler.read_file(&path);
                    cont(data)
                }
                Io::GetTime { cont } => {
                    let t = handler.get_time();
                    cont(t)
                }
                Io::Sleep { duration, cont } => {
                    handler.sleep(duration);
                    cont(())
                }
                Io::DrawImage { image, cont } => {
                    handler.draw_image(&image);
                    cont(())
                }
            };
        }
    }
}

/// Performs the real-world action behind each request variant.
///
/// Implementations are external to this crate by design; tests use an
/// in-memory recording handler. Methods are infallible because the
/// program tree has no failure path (see the module docs).
pub trait Handler {
    fn put_text(&mut self, text: &str);
    fn get_text(&mut self) -> String;
    fn write_file(&mut self, path: &str, data: &[u8]);
    fn read_file(&mut self, path: &str) -> Vec<u8>;
    fn get_time(&mut self) -> Timestamp;
    fn sleep(&mut self, duration: Span);
    fn draw_image(&mut self, image: &ImageTree);
}

/// A terminated program. `bind(pure(v), f)` is exactly `f(v)`.
pub fn pure<R>(value: R) -> Io<R> {
    Io::Done(value)
}

/// A program that emits `text` and yields `()`.
pub fn print(text: impl Into<String>) -> Io<()> {
    Io::PutText {
        text: text.into(),
        cont: Box::new(Io::Done),
    }
}

/// A program that reads one line of text.
pub fn input() -> Io<String> {
    Io::GetText {
        cont: Box::new(Io::Done),
    }
}

/// A program that writes `data` to `path` and yields `()`.
pub fn write_file(path: impl Into<String>, data: Vec<u8>) -> Io<()> {
    Io::WriteFile {
        path: path.into(),
        data,
        cont: Box::new(Io::Done),
    }
}

/// A program that yields the contents of `path`.
pub fn read_file(path: impl Into<String>) -> Io<Vec<u8>> {
    Io::ReadFile {
        path: path.into(),
        cont: Box::new(Io::Done),
    }
}

/// A program that yields the current time.
pub fn now() -> Io<Timestamp> {
    Io::GetTime {
        cont: Box::new(Io::Done),
    }
}

/// A program that suspends for `duration` and yields `()`.
pub fn sleep(duration: Span) -> Io<()> {
    Io::Sleep {
        duration,
        cont: Box::new(Io::Done),
    }
}

/// A program that displays `image` and yields `()`.
pub fn draw_image(image: ImageTree) -> Io<()> {
    Io::DrawImage {
        image,
        cont: Box::new(Io::Done),
    }
}

impl<R: fmt::Debug> fmt::Debug for Io<R> {
    /// Shows the pending variant and its payload; continuations are
    /// opaque and elided.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Io::Done(v) => f.debug_tuple("Done").field(v).finish(),
            Io::PutText { text, .. } => f
                .debug_struct("PutText")
                .field("text", text)
                .finish_non_exhaustive(),
            Io::GetText { .. } => f.debug_struct("GetText").finish_non_exhaustive(),
            Io::WriteFile { path, data, .. } => f
                .debug_struct("WriteFile")
                .field("path", path)
                .field("data", data)
                .finish_non_exhaustive(),
            Io::ReadFile { path, .. } => f
                .debug_struct("ReadFile")
                .field("path", path)
                .finish_non_exhaustive(),
            Io::GetTime { .. } => f.debug_struct("GetTime").finish_non_exhaustive(),
            Io::Sleep { duration, .. } => f
                .debug_struct("Sleep")
                .field("duration", duration)
                .finish_non_exhaustive(),
            Io::DrawImage { image, .. } => f
                .debug_struct("DrawImage")
                .field("image", image)
                .finish_non_exhaustive(),
        }
    }
}
