//! Reader for Photoshop clipping paths embedded in JPEG and TIFF files.
//!
//! Both containers carry Photoshop image resources (8BIM blocks):
//! JPEG in an APP13 segment headed `Photoshop 3.0\0`, TIFF in IFD tag
//! 34377. Saved paths live in resources 2000–2997. Resource 2999 names the
//! path that acts as the clipping path; without it the first saved path is
//! used.
//!
//! Path data is a list of 26-byte records. Each starts with a big-endian
//! selector:
//!
//! | selector | record                         |
//! |----------|--------------------------------|
//! | 0 / 3    | closed / open subpath length   |
//! | 1, 2     | closed subpath Bézier knot     |
//! | 4, 5     | open subpath Bézier knot       |
//! | 6–8      | fill rule and clipboard (skip) |
//!
//! A knot holds three points (control in, anchor, control out). Every point
//! is stored vertical first as signed 8.24 fixed-point fractions of the
//! image size, so the path scales with whatever the image is resized to.

const PHOTOSHOP_HEADER: &[u8] = b"Photoshop 3.0\0";
const BIM_MARKER: &[u8] = b"8BIM";
const CLIPPING_PATH_NAME_ID: u16 = 2999;
const FIRST_PATH_ID: u16 = 2000;
const LAST_PATH_ID: u16 = 2997;
const TIFF_PHOTOSHOP_TAG: u16 = 34377;
const RECORD_LEN: usize = 26;

/// Line segments used to approximate each cubic Bézier segment.
const CURVE_STEPS: usize = 8;

/// A point as fractions of image width (`x`) and height (`y`).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Knot {
    pub control_in: PathPoint,
    pub anchor: PathPoint,
    pub control_out: PathPoint,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subpath {
    pub closed: bool,
    pub knots: Vec<Knot>,
}

/// A clipping path as stored in the file, resolution independent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipPath {
    pub name: Option<String>,
    pub subpaths: Vec<Subpath>,
}

impl ClipPath {
    pub fn is_empty(&self) -> bool {
        self.subpaths.iter().all(|s| s.knots.is_empty())
    }

    /// Flatten the path into pixel-space polygons for a `width`×`height`
    /// image. Open subpaths are closed implicitly, as a fill would.
    pub fn polygons(&self, width: u32, height: u32) -> Vec<Vec<(f32, f32)>> {
        let (w, h) = (width as f64, height as f64);
        let to_px = |p: PathPoint| ((p.x * w) as f32, (p.y * h) as f32);

        self.subpaths
            .iter()
            .filter(|s| !s.knots.is_empty())
            .map(|subpath| {
                let knots = &subpath.knots;
                let mut points = vec![to_px(knots[0].anchor)];
                for i in 0..knots.len() {
                    let from = knots[i];
                    let to = knots[(i + 1) % knots.len()];
                    for step in 1..=CURVE_STEPS {
                        let t = step as f64 / CURVE_STEPS as f64;
                        points.push(to_px(cubic(
                            from.anchor,
                            from.control_out,
                            to.control_in,
                            to.anchor,
                            t,
                        )));
                    }
                }
                points
            })
            .collect()
    }
}

fn cubic(p0: PathPoint, p1: PathPoint, p2: PathPoint, p3: PathPoint, t: f64) -> PathPoint {
    let u = 1.0 - t;
    let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
    PathPoint {
        x: a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        y: a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    }
}

/// Read the clipping path from raw file bytes, sniffing JPEG or TIFF.
/// Returns `None` when the file has no usable path or cannot be parsed.
pub fn read_clip_path(data: &[u8]) -> Option<ClipPath> {
    let resources = if data.starts_with(&[0xFF, 0xD8]) {
        find_jpeg_photoshop_block(data)?
    } else if data.starts_with(b"II") || data.starts_with(b"MM") {
        find_tiff_photoshop_block(data)?
    } else {
        return None;
    };
    select_clip_path(resources)
}

/// One Photoshop image resource.
struct Resource<'a> {
    id: u16,
    name: String,
    data: &'a [u8],
}

fn select_clip_path(block: &[u8]) -> Option<ClipPath> {
    let resources = parse_8bim(block);

    let clip_name = resources
        .iter()
        .find(|r| r.id == CLIPPING_PATH_NAME_ID)
        .and_then(|r| pascal_string(r.data));

    let is_path = |r: &&Resource| (FIRST_PATH_ID..=LAST_PATH_ID).contains(&r.id);
    let chosen = clip_name
        .as_ref()
        .and_then(|name| resources.iter().filter(is_path).find(|r| &r.name == name))
        .or_else(|| resources.iter().find(is_path))?;

    let subpaths = parse_path_records(chosen.data);
    let path = ClipPath {
        name: (!chosen.name.is_empty()).then(|| chosen.name.clone()),
        subpaths,
    };
    (!path.is_empty()).then_some(path)
}

// ---------------------------------------------------------------------------
// Path records
// ---------------------------------------------------------------------------

fn parse_path_records(data: &[u8]) -> Vec<Subpath> {
    let mut subpaths: Vec<Subpath> = Vec::new();

    for record in data.chunks_exact(RECORD_LEN) {
        let selector = u16::from_be_bytes([record[0], record[1]]);
        match selector {
            0 | 3 => subpaths.push(Subpath {
                closed: selector == 0,
                knots: Vec::new(),
            }),
            1 | 2 | 4 | 5 => {
                let knot = Knot {
                    control_in: read_point(&record[2..10]),
                    anchor: read_point(&record[10..18]),
                    control_out: read_point(&record[18..26]),
                };
                // Knots before any length record start an implicit subpath
                if subpaths.is_empty() {
                    subpaths.push(Subpath {
                        closed: selector <= 2,
                        knots: Vec::new(),
                    });
                }
                if let Some(current) = subpaths.last_mut() {
                    current.knots.push(knot);
                }
            }
            _ => {}
        }
    }

    subpaths
}

/// Vertical then horizontal component, both signed 8.24 fixed point.
fn read_point(bytes: &[u8]) -> PathPoint {
    let fixed = |b: &[u8]| i32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64 / (1 << 24) as f64;
    PathPoint {
        y: fixed(&bytes[0..4]),
        x: fixed(&bytes[4..8]),
    }
}

fn pascal_string(data: &[u8]) -> Option<String> {
    let len = *data.first()? as usize;
    let bytes = data.get(1..1 + len)?;
    Some(String::from_utf8_lossy(bytes).into_owned())
}

// ---------------------------------------------------------------------------
// 8BIM resource blocks
// ---------------------------------------------------------------------------

/// Walk every 8BIM resource in a Photoshop image resource block.
fn parse_8bim(segment: &[u8]) -> Vec<Resource<'_>> {
    let data = segment.strip_prefix(PHOTOSHOP_HEADER).unwrap_or(segment);
    let mut resources = Vec::new();

    let mut pos = 0;
    while pos + 12 <= data.len() {
        // Each resource: "8BIM" (4) + id (2) + pascal name + data_len (4) + data
        if &data[pos..pos + 4] != BIM_MARKER {
            pos += 1;
            continue;
        }
        pos += 4;

        let id = u16::from_be_bytes([data[pos], data[pos + 1]]);
        pos += 2;

        let name = pascal_string(&data[pos..]).unwrap_or_default();
        let name_len = data[pos] as usize;
        // Pascal string padded to even total length
        pos += 1 + name_len + ((1 + name_len) % 2);

        let Some(len_bytes) = data.get(pos..pos + 4) else {
            break;
        };
        let len = u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]])
            as usize;
        pos += 4;

        let Some(body) = data.get(pos..pos + len) else {
            break;
        };
        resources.push(Resource {
            id,
            name,
            data: body,
        });

        pos += len + (len % 2);
    }

    resources
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

/// Concatenate every APP13 Photoshop segment in a JPEG.
///
/// Large resource blocks are split across consecutive APP13 segments, each
/// with its own header, so the headers are stripped before joining.
fn find_jpeg_photoshop_block(data: &[u8]) -> Option<&[u8]> {
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = data[pos + 1];
        // SOS means entropy-coded data follows
        if marker == 0xDA || marker == 0xD9 {
            break;
        }
        if marker == 0xFF || marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            pos += if marker == 0xFF { 1 } else { 2 };
            continue;
        }
        let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if seg_len < 2 {
            break;
        }
        let seg_end = (pos + 2 + seg_len).min(data.len());
        if marker == 0xED {
            let segment = &data[pos + 4..seg_end];
            if segment.starts_with(PHOTOSHOP_HEADER) {
                return Some(segment);
            }
        }
        pos += 2 + seg_len;
    }
    None
}

/// Find the Photoshop resource block (tag 34377) in a TIFF's IFD chain.
fn find_tiff_photoshop_block(data: &[u8]) -> Option<&[u8]> {
    let big_endian = match data.get(0..2)? {
        b"MM" => true,
        b"II" => false,
        _ => return None,
    };

    let read_u16 = |offset: usize| -> Option<u16> {
        let b = data.get(offset..offset + 2)?;
        Some(if big_endian {
            u16::from_be_bytes([b[0], b[1]])
        } else {
            u16::from_le_bytes([b[0], b[1]])
        })
    };
    let read_u32 = |offset: usize| -> Option<u32> {
        let b = data.get(offset..offset + 4)?;
        Some(if big_endian {
            u32::from_be_bytes([b[0], b[1], b[2], b[3]])
        } else {
            u32::from_le_bytes([b[0], b[1], b[2], b[3]])
        })
    };

    if read_u16(2)? != 42 {
        return None;
    }

    let mut ifd_offset = read_u32(4)? as usize;
    // Bound the walk so a cyclic IFD chain cannot loop forever.
    let mut remaining_ifds = 64;

    while ifd_offset > 0 && remaining_ifds > 0 {
        remaining_ifds -= 1;
        let entry_count = read_u16(ifd_offset)? as usize;
        let entries_start = ifd_offset + 2;

        for i in 0..entry_count {
            let entry = entries_start + i * 12;
            let tag = read_u16(entry)?;
            if tag != TIFF_PHOTOSHOP_TAG {
                continue;
            }
            let typ = read_u16(entry + 2)?;
            let count = read_u32(entry + 4)? as usize;
            // BYTE or UNDEFINED; anything wider is not a resource block
            if typ != 1 && typ != 7 {
                continue;
            }
            if count <= 4 {
                return data.get(entry + 8..entry + 8 + count);
            }
            let value_offset = read_u32(entry + 8)? as usize;
            return data.get(value_offset..value_offset + count);
        }

        ifd_offset = read_u32(entries_start + entry_count * 12)? as usize;
    }

    None
}
