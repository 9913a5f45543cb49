use super::cost::CostMatrix;
use super::distribution::Distribution;
use super::result::SinkhornConfig;
use super::sinkhorn::sinkhorn;
use crate::error::InputError;
use crate::layout::Kind;
use crate::numeric::Matrix;
use crate::Energy;
use crate::Meters;
use crate::Radians;
use serde::Deserialize;
use serde::Serialize;

/// entropic blur for the position matching. positions are in meters,
/// so this is deliberately loose; the argmax sharpens it afterwards.
const INTERPOLATION_EPSILON: Energy = 10.;

/// a furnishing footprint reduced to what the interpolation needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: Meters,
    pub z: Meters,
    pub rotation: Radians,
    pub kind: Kind,
}

/// one interpolated item of a transition frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    pub x: Meters,
    pub z: Meters,
    pub rotation: Radians,
    pub opacity: f64,
    pub kind: Kind,
}

/// dominant assignment of the plan: each source row takes its argmax
/// column, but a column already claimed leaves later rows unmatched,
/// so surplus items on either side are free to fade.
fn assignment(plan: &Matrix) -> Vec<Option<usize>> {
    let mut claimed = std::collections::BTreeSet::new();
    (0..plan.rows())
        .map(|i| {
            let j = plan
                .row(i)
                .iter()
                .enumerate()
                .max_by(|(_, x), (_, y)| x.partial_cmp(y).expect("finite plan"))
                .map(|(j, _)| j)
                .expect("non-empty row");
            claimed.insert(j).then_some(j)
        })
        .collect()
}

/// wrap the rotation difference into (-pi, pi] so blending takes the
/// short way around
fn shortest_arc(from: Radians, to: Radians, t: f64) -> Radians {
    let mut delta = (to - from).rem_euclid(std::f64::consts::TAU);
    if delta > std::f64::consts::PI {
        delta -= std::f64::consts::TAU;
    }
    from + t * delta
}

/// blend two layouts along the transport plan at parameter t.
///
/// matched pairs glide and turn; source items with no match fade out,
/// target items with no match fade in; kinds swap at the halfway point.
pub fn displacement_interpolation(
    a: &[Pose],
    b: &[Pose],
    plan: &Matrix,
    t: f64,
) -> Result<Vec<Tween>, InputError> {
    if plan.rows() != a.len() || plan.cols() != b.len() {
        return Err(InputError::DimensionMismatch {
            rows: plan.rows(),
            cols: plan.cols(),
            len: a.len(),
        });
    }
    let t = t.clamp(0., 1.);
    let matches = match b.is_empty() {
        true => vec![],
        false => assignment(plan),
    };
    let mut tweens = vec![];
    for (i, pose) in a.iter().enumerate() {
        match matches.get(i).copied().flatten() {
            Some(j) => {
                let target = &b[j];
                tweens.push(Tween {
                    x: pose.x + t * (target.x - pose.x),
                    z: pose.z + t * (target.z - pose.z),
                    rotation: shortest_arc(pose.rotation, target.rotation, t),
                    opacity: 1.,
                    kind: match t < 0.5 {
                        true => pose.kind,
                        false => target.kind,
                    },
                });
            }
            None => tweens.push(Tween {
                x: pose.x,
                z: pose.z,
                rotation: pose.rotation,
                opacity: 1. - t,
                kind: pose.kind,
            }),
        }
    }
    for (j, pose) in b.iter().enumerate() {
        if !matches.contains(&Some(j)) {
            tweens.push(Tween {
                x: pose.x,
                z: pose.z,
                rotation: pose.rotation,
                opacity: t,
                kind: pose.kind,
            });
        }
    }
    Ok(tweens)
}

/// n + 1 frames of the transition from layout a to layout b.
pub fn generate_transition_keyframes(
    a: &[Pose],
    b: &[Pose],
    frames: usize,
) -> Result<Vec<Vec<Tween>>, InputError> {
    let frames = frames.max(1);
    let plan = match a.is_empty() || b.is_empty() {
        true => Matrix::zeros(a.len(), b.len()),
        false => {
            let cost = CostMatrix::new(Matrix::from_fn(a.len(), b.len(), |i, j| {
                (a[i].x - b[j].x).powi(2) + (a[i].z - b[j].z).powi(2)
            }))?;
            let mu = Distribution::uniform(a.len());
            let nu = Distribution::uniform(b.len());
            sinkhorn(&mu, &nu, &cost, SinkhornConfig::from(INTERPOLATION_EPSILON))?.plan
        }
    };
    (0..=frames)
        .map(|k| displacement_interpolation(a, b, &plan, k as f64 / frames as f64))
        .collect()
}
