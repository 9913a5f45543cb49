use crate::numeric::Mulberry32;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nsga2Config {
    pub population: usize,
    pub generations: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    /// SBX distribution index; sharper spread as it grows
    pub sbx_index: f64,
    /// polynomial mutation distribution index
    pub mutation_index: f64,
    /// swap genes uniformly instead of simulated binary crossover
    pub uniform_crossover: bool,
    /// per-gene box bounds; also sets the mutation scale
    pub bounds: Option<Vec<(f64, f64)>>,
    pub seed: u32,
}

impl Default for Nsga2Config {
    fn default() -> Self {
        Self {
            population: 60,
            generations: 50,
            crossover_rate: 0.9,
            mutation_rate: 0.1,
            sbx_index: 15.,
            mutation_index: 20.,
            uniform_crossover: false,
            bounds: None,
            seed: crate::DEFAULT_SEED,
        }
    }
}

/// one member of the returned front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoSolution {
    pub state: Vec<f64>,
    pub objectives: Vec<f64>,
    pub rank: usize,
    pub crowding: f64,
}

/// does a dominate b: no worse everywhere, strictly better somewhere
fn dominates(a: &[f64], b: &[f64]) -> bool {
    let mut strict = false;
    for (x, y) in a.iter().zip(b.iter()) {
        if x > y {
            return false;
        }
        if x < y {
            strict = true;
        }
    }
    strict
}

/// fast non-dominated sort; returns each individual's front rank.
fn ranks(objectives: &[Vec<f64>]) -> Vec<usize> {
    let n = objectives.len();
    let mut dominated_by = vec![0usize; n];
    let mut dominating = vec![vec![]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j && dominates(&objectives[i], &objectives[j]) {
                dominating[i].push(j);
                dominated_by[j] += 1;
            }
        }
    }
    let mut rank = vec![0usize; n];
    let mut front = (0..n).filter(|&i| dominated_by[i] == 0).collect::<Vec<_>>();
    let mut level = 0;
    while !front.is_empty() {
        let mut next = vec![];
        for &i in front.iter() {
            rank[i] = level;
            for &j in dominating[i].iter() {
                dominated_by[j] -= 1;
                if dominated_by[j] == 0 {
                    next.push(j);
                }
            }
        }
        front = next;
        level += 1;
    }
    rank
}

/// crowding distance within one front; boundary members get infinity.
fn crowding(front: &[usize], objectives: &[Vec<f64>]) -> Vec<f64> {
    let m = objectives.first().map(Vec::len).unwrap_or(0);
    let mut distance = vec![0f64; front.len()];
    for objective in 0..m {
        let mut order = (0..front.len()).collect::<Vec<_>>();
        order.sort_by(|&a, &b| {
            objectives[front[a]][objective]
                .partial_cmp(&objectives[front[b]][objective])
                .expect("finite objectives")
        });
        let lo = objectives[front[order[0]]][objective];
        let hi = objectives[front[*order.last().expect("nonempty front")]][objective];
        distance[order[0]] = f64::INFINITY;
        distance[*order.last().expect("nonempty front")] = f64::INFINITY;
        if hi - lo <= 0. {
            continue;
        }
        for w in order.windows(3) {
            let gain = (objectives[front[w[2]]][objective] - objectives[front[w[0]]][objective])
                / (hi - lo);
            distance[w[1]] += gain;
        }
    }
    distance
}

struct Nsga2<'a, F: Fn(&[f64]) -> Vec<f64> + Sync> {
    objective: F,
    config: &'a Nsga2Config,
    rng: Mulberry32,
    genes: Vec<Vec<f64>>,
    objectives: Vec<Vec<f64>>,
}

impl<'a, F: Fn(&[f64]) -> Vec<f64> + Sync> Nsga2<'a, F> {
    fn new(initial: &[Vec<f64>], objective: F, config: &'a Nsga2Config) -> Self {
        let mut rng = Mulberry32::from(config.seed);
        let mut genes = vec![];
        // recycle the given seeds with jitter until the population is full
        for i in 0..config.population {
            let template = &initial[i % initial.len()];
            let member = match i < initial.len() {
                true => template.clone(),
                false => template
                    .iter()
                    .map(|g| g + 0.1 * rng.gaussian())
                    .collect(),
            };
            genes.push(member);
        }
        let objectives = genes.iter().map(|g| objective(g)).collect();
        Self {
            objective,
            config,
            rng,
            genes,
            objectives,
        }
    }

    /// evaluate a brood; the parallel path collects in index order so
    /// the run stays deterministic
    fn evaluate(&self, offspring: &[Vec<f64>]) -> Vec<Vec<f64>> {
        #[cfg(feature = "parallel")]
        let kids: Vec<Vec<f64>> = {
            use rayon::prelude::*;
            offspring.par_iter().map(|g| (self.objective)(g)).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let kids = offspring.iter().map(|g| (self.objective)(g)).collect();
        kids
    }

    fn evolve(mut self) -> Self {
        for generation in 0..self.config.generations {
            let offspring = self.brood();
            let kids = self.evaluate(&offspring);
            self.genes.extend(offspring);
            self.objectives.extend(kids);
            self.cull();
            if generation % 10 == 9 {
                log::debug!(
                    "{:<32}generation {}",
                    "nsga2 evolving",
                    generation + 1
                );
            }
        }
        self
    }

    /// binary tournament on (rank, -crowding)
    fn select(&mut self, rank: &[usize], crowd: &[f64]) -> usize {
        let a = self.rng.below(self.genes.len());
        let b = self.rng.below(self.genes.len());
        match rank[a]
            .cmp(&rank[b])
            .then(crowd[b].partial_cmp(&crowd[a]).expect("comparable crowding"))
        {
            std::cmp::Ordering::Greater => b,
            _ => a,
        }
    }

    fn brood(&mut self) -> Vec<Vec<f64>> {
        let rank = ranks(&self.objectives);
        let crowd = self.crowding_all(&rank);
        let mut offspring = vec![];
        while offspring.len() < self.config.population {
            let p1 = self.select(&rank, &crowd);
            let p2 = self.select(&rank, &crowd);
            let (mut c1, mut c2) = match self.rng.chance(self.config.crossover_rate) {
                true => self.crossover(p1, p2),
                false => (self.genes[p1].clone(), self.genes[p2].clone()),
            };
            self.mutate(&mut c1);
            self.mutate(&mut c2);
            offspring.push(c1);
            if offspring.len() < self.config.population {
                offspring.push(c2);
            }
        }
        offspring
    }

    fn crossover(&mut self, p1: usize, p2: usize) -> (Vec<f64>, Vec<f64>) {
        let a = self.genes[p1].clone();
        let b = self.genes[p2].clone();
        let mut c1 = a.clone();
        let mut c2 = b.clone();
        match self.config.uniform_crossover {
            true => {
                for i in 0..a.len() {
                    if self.rng.chance(0.5) {
                        c1[i] = b[i];
                        c2[i] = a[i];
                    }
                }
            }
            false => {
                for i in 0..a.len() {
                    if !self.rng.chance(0.5) {
                        continue;
                    }
                    let u = self.rng.next();
                    let eta = self.config.sbx_index;
                    let beta = match u < 0.5 {
                        true => (2. * u).powf(1. / (eta + 1.)),
                        false => (1. / (2. * (1. - u)).max(1e-12)).powf(1. / (eta + 1.)),
                    };
                    c1[i] = 0.5 * ((1. + beta) * a[i] + (1. - beta) * b[i]);
                    c2[i] = 0.5 * ((1. - beta) * a[i] + (1. + beta) * b[i]);
                }
            }
        }
        (c1, c2)
    }

    fn mutate(&mut self, genes: &mut [f64]) {
        for (i, gene) in genes.iter_mut().enumerate() {
            if !self.rng.chance(self.config.mutation_rate) {
                continue;
            }
            let u = self.rng.next();
            let eta = self.config.mutation_index;
            let delta = match u < 0.5 {
                true => (2. * u).powf(1. / (eta + 1.)) - 1.,
                false => 1. - (2. * (1. - u)).powf(1. / (eta + 1.)),
            };
            let scale = match self.config.bounds.as_ref().and_then(|b| b.get(i)) {
                Some((lo, hi)) => hi - lo,
                None => 1.,
            };
            *gene += delta * scale;
            if let Some((lo, hi)) = self.config.bounds.as_ref().and_then(|b| b.get(i)) {
                *gene = gene.clamp(*lo, *hi);
            }
        }
    }

    fn crowding_all(&self, rank: &[usize]) -> Vec<f64> {
        let mut crowd = vec![0f64; self.genes.len()];
        let levels = rank.iter().copied().max().map(|m| m + 1).unwrap_or(0);
        for level in 0..levels {
            let front = (0..self.genes.len())
                .filter(|&i| rank[i] == level)
                .collect::<Vec<_>>();
            for (slot, value) in front.iter().zip(crowding(&front, &self.objectives)) {
                crowd[*slot] = value;
            }
        }
        crowd
    }

    /// elitist environmental selection: keep the best P of parents
    /// plus offspring by (rank, crowding)
    fn cull(&mut self) {
        let rank = ranks(&self.objectives);
        let crowd = self.crowding_all(&rank);
        let mut order = (0..self.genes.len()).collect::<Vec<_>>();
        order.sort_by(|&a, &b| {
            rank[a]
                .cmp(&rank[b])
                .then(crowd[b].partial_cmp(&crowd[a]).expect("comparable crowding"))
        });
        order.truncate(self.config.population);
        self.genes = order.iter().map(|&i| self.genes[i].clone()).collect();
        self.objectives = order.iter().map(|&i| self.objectives[i].clone()).collect();
    }

    fn solutions(self) -> Vec<ParetoSolution> {
        let rank = ranks(&self.objectives);
        let crowd = self.crowding_all(&rank);
        let mut out = self
            .genes
            .into_iter()
            .zip(self.objectives)
            .zip(rank.iter().zip(crowd))
            .map(|((state, objectives), (&rank, crowding))| ParetoSolution {
                state,
                objectives,
                rank,
                crowding,
            })
            .collect::<Vec<_>>();
        out.sort_by(|a, b| {
            a.rank
                .cmp(&b.rank)
                .then(b.crowding.partial_cmp(&a.crowding).expect("comparable crowding"))
        });
        out
    }
}

/// evolve a population toward the Pareto front of a vector objective.
pub fn nsga2(
    initial: &[Vec<f64>],
    objective: impl Fn(&[f64]) -> Vec<f64> + Sync,
    config: &Nsga2Config,
) -> Vec<ParetoSolution> {
    assert!(!initial.is_empty(), "seed population required");
    Nsga2::new(initial, objective, config).evolve().solutions()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bi(x: &[f64]) -> Vec<f64> {
        vec![x[0] * x[0], (x[0] - 2.) * (x[0] - 2.)]
    }

    #[test]
    fn front_zero_is_mutually_non_dominated() {
        let initial = vec![vec![0.1], vec![1.0], vec![1.9]];
        let solutions = nsga2(&initial, bi, &Nsga2Config::default());
        let front = solutions
            .iter()
            .filter(|s| s.rank == 0)
            .collect::<Vec<_>>();
        for a in front.iter() {
            for b in front.iter() {
                assert!(!dominates(&a.objectives, &b.objectives), "{:?} < {:?}", a, b);
            }
        }
    }

    #[test]
    fn front_spans_the_tradeoff() {
        let initial = vec![vec![0.1], vec![1.0], vec![1.9]];
        let solutions = nsga2(&initial, bi, &Nsga2Config::default());
        let xs = solutions
            .iter()
            .filter(|s| s.rank == 0)
            .map(|s| s.state[0])
            .collect::<Vec<_>>();
        let near = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let far = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(near <= 0.5, "{}", near);
        assert!(far >= 1.5, "{}", far);
    }

    #[test]
    fn uniform_crossover_also_converges() {
        let initial = vec![vec![0.5], vec![1.5]];
        let config = Nsga2Config {
            uniform_crossover: true,
            generations: 30,
            ..Nsga2Config::default()
        };
        let solutions = nsga2(&initial, bi, &config);
        assert!(solutions.iter().any(|s| s.rank == 0));
        assert!(solutions.len() == config.population);
    }

    #[test]
    fn deterministic_per_seed() {
        let initial = vec![vec![0.1], vec![1.9]];
        let one = nsga2(&initial, bi, &Nsga2Config::default());
        let two = nsga2(&initial, bi, &Nsga2Config::default());
        assert!(one == two);
    }

    #[test]
    fn boundary_solutions_get_infinite_crowding() {
        let objectives = vec![vec![0., 4.], vec![1., 1.], vec![4., 0.]];
        let front = vec![0, 1, 2];
        let crowd = crowding(&front, &objectives);
        assert!(crowd[0].is_infinite());
        assert!(crowd[2].is_infinite());
        assert!(crowd[1].is_finite());
    }

    #[test]
    fn dominance_is_strict() {
        assert!(dominates(&[0., 0.], &[1., 1.]));
        assert!(dominates(&[0., 1.], &[1., 1.]));
        assert!(!dominates(&[1., 1.], &[1., 1.]));
        assert!(!dominates(&[0., 2.], &[1., 1.]));
    }
}
