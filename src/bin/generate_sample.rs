use purine_lookup::{Column, HeaderStyle};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// Render a measured quantity the way the survey tables do: small values
/// are reported as trace, one decimal otherwise.
fn render(value: f64) -> String {
    if value < 0.5 {
        "Tr".to_string()
    } else {
        format!("{value:.1}")
    }
}

fn main() {
    let mut rng = SimpleRng::new(42);

    // (category, typical total purine, foods)
    let groups: [(&str, f64, &[&str]); 6] = [
        ("谷类及制品", 40.0, &["大米", "小米", "玉米", "燕麦", "面条", "馒头"]),
        ("蔬菜类及制品", 25.0, &["白菜", "菠菜", "芹菜", "黄瓜", "番茄", "香菇"]),
        ("畜肉类及制品", 120.0, &["牛肉", "猪肉", "羊肉", "猪肝", "牛肚"]),
        ("禽肉类及制品", 130.0, &["鸡肉", "鸭肉", "鸡肝", "鹅肉"]),
        ("鱼虾蟹贝类", 180.0, &["带鱼", "鲤鱼", "虾", "蛤蜊", "沙丁鱼"]),
        ("干豆类及制品", 150.0, &["黄豆", "绿豆", "豆腐", "红豆"]),
    ];
    let sites = ["北京", "上海", "广州", "成都", "西安"];

    let output_path = "purine_data.csv";
    let file = std::fs::File::create(output_path).expect("Failed to create output file");
    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record(Column::ALL.iter().map(|c| c.label(HeaderStyle::Plain)))
        .expect("Failed to write header");

    let mut rows = 0;
    for (category, typical, foods) in &groups {
        for food in foods.iter() {
            // Split the total across the four bases; xanthine is usually tiny.
            let total = typical * (0.4 + 1.2 * rng.next_f64());
            let shares = [0.4, 0.35, 0.2, 0.05].map(|w| w * (0.7 + 0.6 * rng.next_f64()));
            let norm: f64 = shares.iter().sum();
            let parts = shares.map(|s| total * s / norm);

            let mut record = vec![category.to_string(), food.to_string()];
            record.extend(parts.iter().map(|&p| render(p)));
            record.push(render(total));
            record.push(rng.pick(&sites).to_string());

            writer.write_record(&record).expect("Failed to write row");
            rows += 1;
        }
    }
    writer.flush().expect("Failed to flush output");

    println!("Wrote {rows} foods in {} categories to {output_path}", groups.len());
}
