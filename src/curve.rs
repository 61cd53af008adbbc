//! Generalized Hilbert ("gilbert") space-filling curve.
//!
//! Unlike the classic Hilbert curve this works on any rectangular grid, not
//! only power-of-two squares, which lets byte buffers of arbitrary length be
//! laid out with good locality on a window of arbitrary size.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

fn add(a: Point, b: Point) -> Point {
    Point::new(a.x + b.x, a.y + b.y)
}

fn sub(a: Point, b: Point) -> Point {
    Point::new(a.x - b.x, a.y - b.y)
}

fn neg(a: Point) -> Point {
    Point::new(-a.x, -a.y)
}

fn half(a: Point) -> Point {
    Point::new(a.x / 2, a.y / 2)
}

fn signum(a: Point) -> Point {
    Point::new(a.x.signum(), a.y.signum())
}

/// Length of an axis-aligned extent vector.
fn extent(a: Point) -> i64 {
    (a.x + a.y).abs()
}

/// Ordered visit of every cell of a `width` x `height` grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Curve {
    width: usize,
    height: usize,
    points: Vec<(usize, usize)>,
}

impl Curve {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(usize, usize)] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.points.iter().copied()
    }
}

impl<'a> IntoIterator for &'a Curve {
    type Item = &'a (usize, usize);
    type IntoIter = std::slice::Iter<'a, (usize, usize)>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Generates the curve for a `width` x `height` grid. The major axis follows
/// the longer side; the curve starts at `(0, 0)`.
pub fn gilbert(width: usize, height: usize) -> Curve {
    let mut points = Vec::with_capacity(width * height);
    if width > 0 && height > 0 {
        let (w, h) = (width as i64, height as i64);
        if width >= height {
            fill(Point::new(0, 0), Point::new(w, 0), Point::new(0, h), &mut points);
        } else {
            fill(Point::new(0, 0), Point::new(0, h), Point::new(w, 0), &mut points);
        }
    }
    Curve {
        width,
        height,
        points,
    }
}

/// Fills the parallelogram spanned by `a` (major) and `b` (minor) at `origin`.
fn fill(origin: Point, a: Point, b: Point, out: &mut Vec<(usize, usize)>) {
    let w = extent(a);
    let h = extent(b);
    let da = signum(a);
    let db = signum(b);

    if h == 1 {
        run(origin, da, w, out);
        return;
    }
    if w == 1 {
        run(origin, db, h, out);
        return;
    }

    let mut a2 = half(a);
    let mut b2 = half(b);
    let w2 = extent(a2);
    let h2 = extent(b2);

    if 2 * w > 3 * h {
        if w2 % 2 != 0 && w > 2 {
            a2 = add(a2, da);
        }
        fill(origin, a2, b, out);
        fill(add(origin, a2), sub(a, a2), b, out);
    } else {
        if h2 % 2 != 0 && h > 2 {
            b2 = add(b2, db);
        }
        fill(origin, b2, a2, out);
        fill(add(origin, b2), a, sub(b, b2), out);
        fill(
            add(add(origin, sub(a, da)), sub(b2, db)),
            neg(b2),
            neg(sub(a, a2)),
            out,
        );
    }
}

fn run(mut p: Point, step: Point, n: i64, out: &mut Vec<(usize, usize)>) {
    for _ in 0..n {
        out.push((p.x as usize, p.y as usize));
        p = add(p, step);
    }
}
